//! Issue tracker access for Issue Scribe.
//!
//! [`IssueTracker`] is the seam sessions and the listing command use;
//! [`GithubTracker`] implements it with GitHub REST for issue creation and
//! GraphQL for Projects v2 board queries.

pub mod commit;
pub mod error;
pub mod github;
mod graphql;

use async_trait::async_trait;

use scribe_models::{CreatedIssue, GeneratedIssue, ProjectHandle, ProjectItem, StatusField};

pub use commit::{commit_batch, CommitOutcome};
pub use error::{Result, TrackerError};
pub use github::GithubTracker;

/// Most items a single listing fetches.
pub const MAX_LISTED_ITEMS: usize = 100;

/// Operations the bot needs from an issue tracker.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// File one issue.
    async fn create_issue(&self, issue: &GeneratedIssue) -> Result<CreatedIssue>;

    /// Resolve the configured project board by number.
    async fn project(&self, number: u64) -> Result<ProjectHandle>;

    /// Fetch the board's `Status` field and its options.
    async fn status_field(&self, project: &ProjectHandle) -> Result<StatusField>;

    /// Fetch up to `limit` board items that are linked to issues.
    async fn project_items(&self, project: &ProjectHandle, limit: usize)
        -> Result<Vec<ProjectItem>>;
}
