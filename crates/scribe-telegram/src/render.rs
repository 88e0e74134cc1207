//! HTML renderings of session and listing messages.

use std::time::Duration;

use scribe_core::{html_escape, truncate_chars, truncate_tail, ListingPage};
use scribe_models::{Bundle, CreatedIssue, IssueBatch, SessionId, SessionMode};
use scribe_tracker::CommitOutcome;

use crate::callback::{CallbackData, ReviewDecision};
use crate::transport::{Button, Keyboard};

/// Telegram rejects longer messages.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Characters of raw model output shown in failure notices.
const DIAGNOSTIC_CHARS: usize = 2500;

/// Characters of in-progress output shown while generating.
const PROGRESS_TAIL_CHARS: usize = 1500;

/// Characters shared by all issue bodies in a review message.
const REVIEW_BODY_BUDGET: usize = 2800;

fn escape_attr(s: &str) -> String {
    html_escape(s).replace('"', "&quot;")
}

fn minutes(window: Duration) -> String {
    let secs = window.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        let m = secs / 60;
        format!("{} minute{}", m, if m == 1 { "" } else { "s" })
    } else {
        format!("{} seconds", secs)
    }
}

fn plural(n: usize, word: &str) -> String {
    format!("{} {}{}", n, word, if n == 1 { "" } else { "s" })
}

/// Opening message of a collection window.
pub fn collect_prompt(mode: SessionMode, window: Duration) -> String {
    let mode_note = match mode {
        SessionMode::Preview => "You will review the draft before anything is filed.",
        SessionMode::Direct => "Issues are filed as soon as they are generated.",
    };
    format!(
        "📝 <b>Describe the issues</b>\n\n\
        Send text and screenshots in as many messages as you like. \
        Press <b>Done</b> or send <code>done</code> when finished.\n\n\
        {}\n<i>This window closes in {}.</i>",
        mode_note,
        minutes(window)
    )
}

/// The Done button shown under the collection prompt.
pub fn collect_buttons(session: &SessionId) -> Keyboard {
    vec![vec![Button::new(
        "✅ Done",
        CallbackData::CollectDone(session.clone()).encode(),
    )]]
}

/// Replaces the collection prompt once the window closes.
pub fn collect_closed(bundle: &Bundle) -> String {
    format!(
        "📝 Collection closed: {}, {}.",
        plural(bundle.texts().len(), "text"),
        plural(bundle.images().len(), "image")
    )
}

/// Acknowledges one message's contribution with running bundle totals.
pub fn contribution_ack(texts: usize, images: usize, bundle: &Bundle) -> String {
    let mut added = Vec::new();
    if texts > 0 {
        added.push(plural(texts, "text"));
    }
    if images > 0 {
        added.push(plural(images, "image"));
    }
    format!(
        "➕ Added {} (total: {}, {})",
        added.join(" and "),
        plural(bundle.texts().len(), "text"),
        plural(bundle.images().len(), "image")
    )
}

/// Posted when a window closes with nothing collected.
pub fn empty_bundle_notice() -> String {
    "🚫 Nothing was collected, so no issues were created.".to_string()
}

/// Warning for an image that could not be downloaded for generation.
pub fn image_warning(index: usize, reason: &str) -> String {
    format!(
        "⚠️ Image {} could not be loaded ({}); continuing without it.",
        index,
        html_escape(reason)
    )
}

/// Warning for attachments that could not be retrieved from the chat at all.
pub fn attachments_unavailable(count: usize) -> String {
    format!(
        "⚠️ {} could not be retrieved and {} not added. Try sending {} again.",
        plural(count, "attachment"),
        if count == 1 { "was" } else { "were" },
        if count == 1 { "it" } else { "them" }
    )
}

/// Generation status, with the tail of the output received so far.
pub fn generating(chars: usize, partial: &str) -> String {
    if partial.is_empty() {
        return "⏳ Generating issues…".to_string();
    }
    format!(
        "⏳ Generating issues… ({} characters)\n<pre>{}</pre>",
        chars,
        html_escape(&truncate_tail(partial, PROGRESS_TAIL_CHARS))
    )
}

/// The draft batch, capped below Telegram's message limit.
///
/// Bodies share a fixed budget; issues that no longer fit are summarized in
/// a trailing "…and N more" line.
pub fn review(batch: &IssueBatch) -> String {
    let per_body = (REVIEW_BODY_BUDGET / batch.len().max(1)).max(80);
    let mut out = format!(
        "📋 <b>Draft: {}</b>\n",
        plural(batch.len(), "issue")
    );
    for (i, issue) in batch.issues.iter().enumerate() {
        let mut block = format!("\n<b>{}. {}</b>\n", i + 1, html_escape(&issue.title));
        if !issue.labels.is_empty() {
            block.push_str(&format!("🏷 {}\n", html_escape(&issue.labels.join(", "))));
        }
        block.push_str(&html_escape(&truncate_chars(issue.body.trim(), per_body)));
        block.push('\n');

        // leave room for the overflow line
        if out.chars().count() + block.chars().count() > MAX_MESSAGE_CHARS - 100 {
            out.push_str(&format!(
                "\n…and {} more (all are filed on confirm)",
                plural(batch.len() - i, "issue")
            ));
            break;
        }
        out.push_str(&block);
    }
    out
}

/// Confirm / Edit / Cancel buttons for a session's draft.
pub fn review_buttons(session: &SessionId) -> Keyboard {
    let button = |label: &str, decision| {
        Button::new(label, CallbackData::Review(session.clone(), decision).encode())
    };
    vec![vec![
        button("✅ Confirm", ReviewDecision::Confirm),
        button("✏️ Edit", ReviewDecision::Edit),
        button("❌ Cancel", ReviewDecision::Cancel),
    ]]
}

/// Posted after an explicit cancel.
pub fn canceled() -> String {
    "🚫 Canceled. No issues were created.".to_string()
}

/// Posted when the review window lapses under the notify policy.
pub fn review_expired() -> String {
    "⌛ The review window expired. No issues were created.".to_string()
}

/// Asks for the single edit message.
pub fn edit_prompt(window: Duration) -> String {
    format!(
        "✏️ Send one message describing what to change. \
        <i>Waiting {}.</i>",
        minutes(window)
    )
}

/// Replaces the edit prompt when no edit arrived.
pub fn edit_timed_out() -> String {
    "⌛ No changes received; the draft is unchanged.".to_string()
}

/// Replaces the edit prompt once the edit is taken.
pub fn edit_received() -> String {
    "✏️ Got it, regenerating…".to_string()
}

/// Status shown while issues are being filed.
pub fn committing(count: usize) -> String {
    format!("📤 Filing {}…", plural(count, "issue"))
}

fn created_list(created: &[CreatedIssue]) -> String {
    created
        .iter()
        .map(|c| {
            format!(
                "• <a href=\"{}\">#{}</a> {}",
                escape_attr(&c.url),
                c.number,
                html_escape(&c.title)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Links to the created issues, or how far filing got before the error.
pub fn commit_result(outcome: &CommitOutcome, total: usize) -> String {
    match &outcome.error {
        None => format!(
            "✅ Created {}:\n{}",
            plural(outcome.created.len(), "issue"),
            created_list(&outcome.created)
        ),
        Some(e) => {
            let mut out = format!(
                "❌ Created {} of {} issues before an error:\n<code>{}</code>",
                outcome.created.len(),
                total,
                html_escape(&truncate_chars(&e.to_string(), 500))
            );
            if !outcome.created.is_empty() {
                out.push_str("\n\n");
                out.push_str(&created_list(&outcome.created));
            }
            out
        }
    }
}

/// Failure notice with the offending model output attached for diagnosis.
/// Failure notice with the offending model output, truncated for diagnosis.
pub fn generation_failure(error: &str, content: &str) -> String {
    let mut out = format!(
        "❌ Issue generation failed:\n<code>{}</code>",
        html_escape(&truncate_chars(error, 800))
    );
    if !content.trim().is_empty() {
        out.push_str(&format!(
            "\n\n<b>Model output:</b>\n<pre>{}</pre>",
            html_escape(&truncate_chars(content, DIAGNOSTIC_CHARS))
        ));
    }
    out
}

/// Generic one-line failure notice.
pub fn failure(what: &str, error: &str) -> String {
    format!(
        "❌ {}: {}",
        what,
        html_escape(&truncate_chars(error, 800))
    )
}

/// One page of the project board listing.
pub fn listing(title: &str, page: &ListingPage, assignee: Option<&str>) -> String {
    let mut out = format!("📋 <b>{}</b>", html_escape(title));
    if let Some(login) = assignee {
        out.push_str(&format!(" · assigned to <b>{}</b>", html_escape(login)));
    }
    out.push('\n');

    if page.entries.is_empty() {
        out.push_str("\nNo open items.");
        return out;
    }

    out.push_str(&format!(
        "<i>{} open, page {} of {}</i>\n",
        page.total_items,
        page.page + 1,
        page.total_pages
    ));
    for entry in &page.entries {
        out.push_str(&format!(
            "\n<a href=\"{}\">#{}</a> <b>{}</b>\n📌 {} · 👤 {}\n{}\n",
            escape_attr(&entry.url),
            entry.number,
            html_escape(&entry.title),
            html_escape(&entry.status),
            html_escape(&entry.assignees),
            html_escape(&entry.preview)
        ));
    }
    out
}

/// Prev / Next buttons; `None` when everything fits on one page.
pub fn listing_buttons(page: &ListingPage, assignee: Option<&str>) -> Option<Keyboard> {
    let data = |p: usize| {
        CallbackData::ListPage {
            page: p,
            assignee: assignee.map(str::to_string),
        }
        .encode()
    };
    let mut row = Vec::new();
    if page.has_prev() {
        row.push(Button::new("◀ Prev", data(page.page - 1)));
    }
    if page.has_next() {
        row.push(Button::new("Next ▶", data(page.page + 1)));
    }
    if row.is_empty() {
        None
    } else {
        Some(vec![row])
    }
}
