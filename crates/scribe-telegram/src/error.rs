//! Error types for the Telegram bot.

use thiserror::Error;

use scribe_completion::CompletionError;
use scribe_core::CoreError;
use scribe_tracker::TrackerError;

/// Errors that can occur in the Telegram bot.
#[derive(Debug, Error)]
pub enum BotError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] CoreError),

    /// Failed to start the bot.
    #[error("Failed to start bot: {0}")]
    BotStartFailed(String),

    /// A Telegram API call failed.
    #[error("Telegram request failed: {0}")]
    Transport(String),

    /// Completion client error.
    #[error(transparent)]
    Completion(#[from] CompletionError),

    /// Tracker client error.
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;

impl From<teloxide::RequestError> for BotError {
    fn from(e: teloxide::RequestError) -> Self {
        BotError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_errors_keep_their_text() {
        let err: BotError = TrackerError::MissingStatusField.into();
        assert_eq!(err.to_string(), "project has no single-select Status field");

        let err: BotError = CoreError::MissingEnv("GITHUB_TOKEN").into();
        assert!(err.to_string().contains("GITHUB_TOKEN"));
    }
}
