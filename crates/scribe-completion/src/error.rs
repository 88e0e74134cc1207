//! Error types for the completion crate.

use thiserror::Error;

/// Errors that can occur while requesting a completion or loading images.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The HTTP request could not be sent.
    #[error("completion request failed: {0}")]
    Http(String),

    /// The API answered with a non-success status.
    #[error("completion API error {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnosis.
        body: String,
    },

    /// The token stream broke or carried an unreadable chunk.
    #[error("completion stream error: {0}")]
    Stream(String),

    /// An image could not be loaded.
    #[error("image fetch failed: {0}")]
    ImageFetch(String),
}

/// Result type for completion operations.
pub type Result<T> = std::result::Result<T, CompletionError>;

impl From<reqwest::Error> for CompletionError {
    fn from(e: reqwest::Error) -> Self {
        CompletionError::Http(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CompletionError::Api {
            status: 401,
            body: "unauthorized".into(),
        };
        assert_eq!(err.to_string(), "completion API error 401: unauthorized");

        let err = CompletionError::ImageFetch("HTTP 404".into());
        assert_eq!(err.to_string(), "image fetch failed: HTTP 404");
    }
}
