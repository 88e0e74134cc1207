//! Error types for the tracker crate.

use thiserror::Error;

/// Errors that can occur while talking to the issue tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The HTTP request could not be sent or its body not read.
    #[error("tracker request failed: {0}")]
    Http(String),

    /// The API answered with a non-success status.
    #[error("tracker API error {status} during {operation}: {body}")]
    Api {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// The GraphQL endpoint reported errors.
    #[error("tracker query failed: {0}")]
    GraphQl(String),

    /// The response did not have the expected shape.
    #[error("unexpected tracker response: {0}")]
    Decode(String),

    /// No project with this number exists for the owner.
    #[error("project #{number} not found for {owner}")]
    ProjectNotFound { owner: String, number: u64 },

    /// The project has no single-select `Status` field.
    #[error("project has no single-select Status field")]
    MissingStatusField,
}

/// Result type for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

impl From<reqwest::Error> for TrackerError {
    fn from(e: reqwest::Error) -> Self {
        TrackerError::Http(e.to_string())
    }
}
