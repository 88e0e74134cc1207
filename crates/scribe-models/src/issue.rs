//! Issue types produced by generation and returned by the tracker.

use serde::{Deserialize, Serialize};

/// A schema-validated candidate ticket produced from a completion response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedIssue {
    /// Issue title.
    pub title: String,

    /// Markdown body.
    pub body: String,

    /// Labels in the order the model produced them.
    #[serde(default)]
    pub labels: Vec<String>,
}

impl GeneratedIssue {
    /// Creates a generated issue.
    pub fn new(title: impl Into<String>, body: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            labels,
        }
    }
}

/// The document shape a completion is asked to return.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IssueBatch {
    /// Issues in input order.
    pub issues: Vec<GeneratedIssue>,
}

impl IssueBatch {
    /// Number of issues in the batch.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Whether the batch has no issues.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

/// A ticket that has been persisted in the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIssue {
    /// Tracker issue number.
    pub number: u64,

    /// Canonical (browser) URL of the issue.
    pub url: String,

    /// Title as stored by the tracker.
    pub title: String,
}
