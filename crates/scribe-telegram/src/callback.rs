//! Inline button payloads.
//!
//! Telegram limits callback data to 64 bytes, so payloads are short
//! colon-separated strings:
//!
//! - `collect:<session>:done`
//! - `review:<session>:confirm|edit|cancel`
//! - `list:<page>:<assignee>` (assignee may be empty)

use scribe_models::SessionId;

/// A decision in the review loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Confirm,
    Edit,
    Cancel,
}

impl ReviewDecision {
    fn as_str(self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::Edit => "edit",
            Self::Cancel => "cancel",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "confirm" => Some(Self::Confirm),
            "edit" => Some(Self::Edit),
            "cancel" => Some(Self::Cancel),
            _ => None,
        }
    }
}

/// Decoded callback data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackData {
    /// Close a session's collection window.
    CollectDone(SessionId),
    /// Review decision for a session.
    Review(SessionId, ReviewDecision),
    /// Show a listing page.
    ListPage { page: usize, assignee: Option<String> },
}

impl CallbackData {
    /// Encode for an inline button.
    pub fn encode(&self) -> String {
        match self {
            Self::CollectDone(id) => format!("collect:{}:done", id),
            Self::Review(id, decision) => format!("review:{}:{}", id, decision.as_str()),
            Self::ListPage { page, assignee } => {
                format!("list:{}:{}", page, assignee.as_deref().unwrap_or(""))
            }
        }
    }

    /// Decode button data; `None` for anything this bot did not produce.
    pub fn parse(data: &str) -> Option<Self> {
        let mut parts = data.splitn(3, ':');
        let kind = parts.next()?;
        let first = parts.next()?;
        let rest = parts.next()?;

        match kind {
            "collect" if rest == "done" && !first.is_empty() => {
                Some(Self::CollectDone(SessionId::from_string(first)))
            }
            "review" if !first.is_empty() => Some(Self::Review(
                SessionId::from_string(first),
                ReviewDecision::parse(rest)?,
            )),
            "list" => Some(Self::ListPage {
                page: first.parse().ok()?,
                assignee: Some(rest.to_string()).filter(|a| !a.is_empty()),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_data() {
        let id = SessionId::new();
        let data = CallbackData::Review(id.clone(), ReviewDecision::Edit);
        let encoded = data.encode();
        assert!(encoded.len() <= 64);
        assert_eq!(CallbackData::parse(&encoded), Some(data));
    }

    #[test]
    fn test_list_data_without_assignee() {
        assert_eq!(
            CallbackData::parse("list:2:"),
            Some(CallbackData::ListPage { page: 2, assignee: None })
        );
        assert_eq!(
            CallbackData::parse("list:0:octocat"),
            Some(CallbackData::ListPage {
                page: 0,
                assignee: Some("octocat".into())
            })
        );
    }

    #[test]
    fn test_foreign_data_rejected() {
        assert_eq!(CallbackData::parse("connect:project-x"), None);
        assert_eq!(CallbackData::parse("review:s1:approve"), None);
        assert_eq!(CallbackData::parse("list:x:"), None);
        assert_eq!(CallbackData::parse("collect::done"), None);
    }
}
