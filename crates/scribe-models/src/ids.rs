//! Type-safe ID wrappers for Issue Scribe.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of one issue-creation session.
///
/// Short enough to embed in button callback payloads, which the chat gateway
/// caps at 64 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new random ID.
    pub fn new() -> Self {
        Self(format!("s{}", Uuid::new_v4().simple()))
    }

    /// Creates an ID from an existing string (for callback parsing/testing).
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_fits_callback_payload() {
        let id = SessionId::new();
        assert!(id.as_str().starts_with('s'));
        // "review:<id>:confirm" must stay under 64 bytes
        assert!(format!("review:{}:confirm", id).len() < 64);
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_id_serialization() {
        let id = SessionId::from_string("s-test");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"s-test\"");

        let parsed: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
