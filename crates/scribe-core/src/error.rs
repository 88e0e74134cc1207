//! Error types for the core crate.

use thiserror::Error;

use crate::validator::ValidationError;

/// Errors raised by configuration and validation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required environment variable is missing or empty.
    #[error("{0} not set. Add it to the environment or to the env file.")]
    MissingEnv(&'static str),

    /// An environment variable could not be parsed.
    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Completion output failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::MissingEnv("GITHUB_TOKEN");
        assert_eq!(
            err.to_string(),
            "GITHUB_TOKEN not set. Add it to the environment or to the env file."
        );

        let err = CoreError::InvalidEnv {
            name: "GITHUB_PROJECT_NUMBER",
            value: "abc".into(),
            reason: "expected a positive integer".into(),
        };
        assert!(err.to_string().contains("GITHUB_PROJECT_NUMBER"));
        assert!(err.to_string().contains("\"abc\""));
    }
}
