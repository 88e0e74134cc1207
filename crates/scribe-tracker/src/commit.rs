//! Sequential filing of a generated batch.

use tracing::{info, warn};

use scribe_models::{CreatedIssue, GeneratedIssue};

use crate::error::TrackerError;
use crate::IssueTracker;

/// What a commit achieved.
#[derive(Debug)]
pub struct CommitOutcome {
    /// Issues created, in input order.
    pub created: Vec<CreatedIssue>,
    /// The error that stopped the commit, if any.
    pub error: Option<TrackerError>,
}

impl CommitOutcome {
    /// Whether every issue was created.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Create issues one at a time in input order.
///
/// The first failure stops the commit; issues already created are kept and
/// reported alongside the error.
pub async fn commit_batch(tracker: &dyn IssueTracker, issues: &[GeneratedIssue]) -> CommitOutcome {
    let mut created = Vec::with_capacity(issues.len());

    for (index, issue) in issues.iter().enumerate() {
        match tracker.create_issue(issue).await {
            Ok(issue) => {
                info!(number = issue.number, "Issue created");
                created.push(issue);
            }
            Err(e) => {
                warn!(
                    index,
                    created = created.len(),
                    remaining = issues.len() - index,
                    error = %e,
                    "Issue creation failed, stopping commit"
                );
                return CommitOutcome {
                    created,
                    error: Some(e),
                };
            }
        }
    }

    CommitOutcome {
        created,
        error: None,
    }
}
