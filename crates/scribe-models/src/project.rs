//! Typed records for project board queries.
//!
//! Every optional piece of a board response is an explicit `Option`, so a
//! missing status or an item without linked issue content is visible in the
//! type rather than discovered at access time.

use serde::{Deserialize, Serialize};

/// A resolved project board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectHandle {
    /// Opaque node id used by subsequent queries.
    pub id: String,

    /// Human readable project title.
    pub title: String,
}

/// One option of a single-select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusOption {
    /// Option id.
    pub id: String,

    /// Display name (e.g. "Backlog", "Done").
    pub name: String,
}

/// The single-select status field of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusField {
    /// Field id.
    pub id: String,

    /// Field name.
    pub name: String,

    /// Options in board order.
    pub options: Vec<StatusOption>,
}

impl StatusField {
    /// Find an option by name, ignoring case.
    pub fn option_named(&self, name: &str) -> Option<&StatusOption> {
        self.options
            .iter()
            .find(|o| o.name.eq_ignore_ascii_case(name))
    }
}

/// The issue linked to a project item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueContent {
    /// Issue number.
    pub number: u64,

    /// Issue title.
    pub title: String,

    /// Issue body (may be empty).
    #[serde(default)]
    pub body: String,

    /// Canonical URL.
    pub url: String,
}

/// A board item with its linked issue, status and assignees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectItem {
    /// Item node id.
    pub id: String,

    /// Linked issue.
    pub content: IssueContent,

    /// Status option, if the item has one.
    pub status: Option<StatusOption>,

    /// Assignee logins.
    #[serde(default)]
    pub assignees: Vec<String>,
}

impl ProjectItem {
    /// Status name, if any.
    pub fn status_name(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.name.as_str())
    }

    /// Whether the item is assigned to `login`, ignoring case.
    pub fn is_assigned_to(&self, login: &str) -> bool {
        self.assignees
            .iter()
            .any(|a| a.eq_ignore_ascii_case(login))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> StatusField {
        StatusField {
            id: "f1".into(),
            name: "Status".into(),
            options: vec![
                StatusOption { id: "o1".into(), name: "Backlog".into() },
                StatusOption { id: "o2".into(), name: "Done".into() },
            ],
        }
    }

    #[test]
    fn test_option_named_ignores_case() {
        let field = field();
        assert_eq!(field.option_named("done").map(|o| o.id.as_str()), Some("o2"));
        assert!(field.option_named("In Review").is_none());
    }

    #[test]
    fn test_is_assigned_to() {
        let item = ProjectItem {
            id: "i1".into(),
            content: IssueContent {
                number: 1,
                title: "t".into(),
                body: String::new(),
                url: "u".into(),
            },
            status: None,
            assignees: vec!["Octocat".into()],
        };
        assert!(item.is_assigned_to("octocat"));
        assert!(!item.is_assigned_to("hubot"));
        assert_eq!(item.status_name(), None);
    }
}
