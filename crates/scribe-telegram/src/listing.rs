//! The project-board listing command.

use tracing::{debug, warn};

use scribe_core::{paginate, project_items};
use scribe_models::Conversation;
use scribe_tracker::MAX_LISTED_ITEMS;

use crate::error::Result;
use crate::render;
use crate::state::BotState;

/// Fetch, project and render one listing page.
///
/// With `message_id` the existing listing is replaced in place (page
/// buttons); otherwise a new message is posted.
pub async fn show_listing(
    state: &BotState,
    conversation: Conversation,
    assignee: Option<&str>,
    page: usize,
    message_id: Option<i32>,
) -> Result<()> {
    let tracker = state.tracker.as_ref();
    let project = tracker.project(state.info.project_number).await?;
    let field = tracker.status_field(&project).await?;
    let items = tracker.project_items(&project, MAX_LISTED_ITEMS).await?;
    let fetched = items.len();

    let projected = project_items(items, &field, assignee);
    let page = paginate(&projected, page);
    debug!(
        chat_id = conversation.chat_id,
        fetched,
        shown = page.total_items,
        page = page.page,
        "Listing projected"
    );

    let html = render::listing(&project.title, &page, assignee);
    let buttons = render::listing_buttons(&page, assignee);
    match message_id {
        Some(id) => state.transport.edit(conversation, id, &html, buttons).await,
        None => state.transport.send(conversation, &html, buttons).await.map(|_| ()),
    }
}

/// Show a listing page, posting a failure notice to the conversation if it
/// cannot be built.
pub async fn present_listing(
    state: &BotState,
    conversation: Conversation,
    assignee: Option<&str>,
    page: usize,
    message_id: Option<i32>,
) {
    let Err(e) = show_listing(state, conversation, assignee, page, message_id).await else {
        return;
    };
    warn!(chat_id = conversation.chat_id, page, error = %e, "Listing failed");
    let notice = render::failure("Failed to list issues", &e.to_string());
    if let Err(e) = state.transport.send(conversation, &notice, None).await {
        warn!(chat_id = conversation.chat_id, error = %e, "Failed to send listing error");
    }
}
