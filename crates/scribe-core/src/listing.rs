//! Read-only projection behind the issue listing command.
//!
//! Items are filtered and ordered here; fetching lives in the tracker crate
//! and rendering in the bot.

use scribe_models::{ProjectItem, StatusField};

use crate::text::truncate_chars;

/// Summaries per page.
pub const LISTING_PAGE_SIZE: usize = 5;

/// Characters of issue body shown in a summary.
pub const BODY_PREVIEW_CHARS: usize = 120;

const DONE_STATUS: &str = "done";
const BACKLOG_STATUS: &str = "backlog";

/// Drop finished items, optionally keep one assignee's items, and put backlog first.
///
/// Items without a status are kept. Ordering is otherwise the input order.
pub fn project_items(
    items: Vec<ProjectItem>,
    field: &StatusField,
    assignee: Option<&str>,
) -> Vec<ProjectItem> {
    let done = field.option_named(DONE_STATUS);
    let backlog = field.option_named(BACKLOG_STATUS);

    let has_status = |item: &ProjectItem, option: Option<&scribe_models::StatusOption>, name: &str| {
        match (&item.status, option) {
            (Some(status), Some(option)) => status.id == option.id,
            (Some(status), None) => status.name.eq_ignore_ascii_case(name),
            (None, _) => false,
        }
    };

    let mut kept: Vec<ProjectItem> = items
        .into_iter()
        .filter(|item| !has_status(item, done, DONE_STATUS))
        .filter(|item| assignee.map_or(true, |login| item.is_assigned_to(login)))
        .collect();

    // sort_by_key is stable, so non-backlog items keep their order
    kept.sort_by_key(|item| !has_status(item, backlog, BACKLOG_STATUS));
    kept
}

/// One rendered entry of a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSummary {
    /// Issue number.
    pub number: u64,
    /// Issue title, unescaped.
    pub title: String,
    /// Issue URL.
    pub url: String,
    /// Status name, or "No status".
    pub status: String,
    /// Comma-separated assignee logins, or "Unassigned".
    pub assignees: String,
    /// Whitespace-collapsed body truncated to [`BODY_PREVIEW_CHARS`].
    pub preview: String,
}

impl ItemSummary {
    fn from_item(item: &ProjectItem) -> Self {
        let body = item.content.body.split_whitespace().collect::<Vec<_>>().join(" ");
        Self {
            number: item.content.number,
            title: item.content.title.clone(),
            url: item.content.url.clone(),
            status: item.status_name().unwrap_or("No status").to_string(),
            assignees: if item.assignees.is_empty() {
                "Unassigned".to_string()
            } else {
                item.assignees.join(", ")
            },
            preview: if body.is_empty() {
                "(no description)".to_string()
            } else {
                truncate_chars(&body, BODY_PREVIEW_CHARS)
            },
        }
    }
}

/// A page of summaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    /// Zero-based page index (clamped to the last page).
    pub page: usize,
    /// Total number of pages; at least 1.
    pub total_pages: usize,
    /// Total number of items across pages.
    pub total_items: usize,
    /// Entries on this page, in projection order.
    pub entries: Vec<ItemSummary>,
}

impl ListingPage {
    /// Whether a previous page exists.
    pub fn has_prev(&self) -> bool {
        self.page > 0
    }

    /// Whether a next page exists.
    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }
}

/// Slice already-projected items into a page.
pub fn paginate(items: &[ProjectItem], page: usize) -> ListingPage {
    let total_pages = items.len().div_ceil(LISTING_PAGE_SIZE).max(1);
    let page = page.min(total_pages - 1);
    let entries = items
        .iter()
        .skip(page * LISTING_PAGE_SIZE)
        .take(LISTING_PAGE_SIZE)
        .map(ItemSummary::from_item)
        .collect();

    ListingPage {
        page,
        total_pages,
        total_items: items.len(),
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_models::{IssueContent, StatusOption};

    fn field() -> StatusField {
        StatusField {
            id: "field".into(),
            name: "Status".into(),
            options: vec![
                StatusOption { id: "opt-backlog".into(), name: "Backlog".into() },
                StatusOption { id: "opt-progress".into(), name: "In Progress".into() },
                StatusOption { id: "opt-done".into(), name: "Done".into() },
            ],
        }
    }

    fn item(number: u64, status: Option<(&str, &str)>, assignees: &[&str]) -> ProjectItem {
        ProjectItem {
            id: format!("item-{}", number),
            content: IssueContent {
                number,
                title: format!("Issue {}", number),
                body: "Body   text\nwith  spacing".into(),
                url: format!("https://github.com/acme/widgets/issues/{}", number),
            },
            status: status.map(|(id, name)| StatusOption { id: id.into(), name: name.into() }),
            assignees: assignees.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_done_dropped_and_backlog_first() {
        let items = vec![
            item(1, Some(("opt-progress", "In Progress")), &[]),
            item(2, Some(("opt-done", "Done")), &[]),
            item(3, None, &[]),
            item(4, Some(("opt-backlog", "Backlog")), &[]),
        ];

        let projected = project_items(items, &field(), None);
        let numbers: Vec<u64> = projected.iter().map(|i| i.content.number).collect();
        assert_eq!(numbers, vec![4, 1, 3]);
    }

    #[test]
    fn test_status_by_name_when_field_lacks_option() {
        let field = StatusField { id: "f".into(), name: "Status".into(), options: vec![] };
        let items = vec![
            item(1, None, &[]),
            item(2, Some(("x", "DONE")), &[]),
            item(3, Some(("y", "backlog")), &[]),
        ];
        let numbers: Vec<u64> = project_items(items, &field, None)
            .iter()
            .map(|i| i.content.number)
            .collect();
        assert_eq!(numbers, vec![3, 1]);
    }

    #[test]
    fn test_assignee_filter() {
        let items = vec![
            item(1, None, &["octocat"]),
            item(2, None, &["hubot"]),
            item(3, None, &["Octocat", "hubot"]),
        ];
        let numbers: Vec<u64> = project_items(items, &field(), Some("octocat"))
            .iter()
            .map(|i| i.content.number)
            .collect();
        assert_eq!(numbers, vec![1, 3]);
    }

    #[test]
    fn test_paginate() {
        let items: Vec<ProjectItem> = (1..=12).map(|n| item(n, None, &[])).collect();

        let first = paginate(&items, 0);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_items, 12);
        assert_eq!(first.entries.len(), LISTING_PAGE_SIZE);
        assert!(!first.has_prev());
        assert!(first.has_next());

        let last = paginate(&items, 99);
        assert_eq!(last.page, 2);
        assert_eq!(last.entries.len(), 2);
        assert_eq!(last.entries[0].number, 11);
        assert!(!last.has_next());
    }

    #[test]
    fn test_empty_listing_has_one_page() {
        let page = paginate(&[], 3);
        assert_eq!(page.page, 0);
        assert_eq!(page.total_pages, 1);
        assert!(page.entries.is_empty());
    }

    #[test]
    fn test_summary_fields() {
        let page = paginate(&[item(7, None, &[])], 0);
        let entry = &page.entries[0];
        assert_eq!(entry.status, "No status");
        assert_eq!(entry.assignees, "Unassigned");
        assert_eq!(entry.preview, "Body text with spacing");
    }
}
