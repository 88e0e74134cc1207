//! Command, message and button handlers for the Telegram bot.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, User};
use teloxide::utils::command::BotCommands;
use tracing::{debug, info, warn};

use scribe_core::html_escape;
use scribe_models::{Conversation, InboundMessage, SessionMode, UserRef};

use crate::callback::CallbackData;
use crate::hub::{CallbackEvent, SessionAction};
use crate::listing::present_listing;
use crate::session::run_session;
use crate::state::BotState;
use crate::transport::TelegramTransport;

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "snake_case", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot and get help")]
    Start,

    #[command(description = "Show help message")]
    Help,

    #[command(description = "Collect notes and screenshots, then file issues: /create_issue [preview]")]
    CreateIssue(String),

    #[command(description = "List open project items: /list_issues [assignee]")]
    ListIssues(String),

    #[command(description = "Check that the bot is alive")]
    Test,
}

fn user_ref(user: &User) -> UserRef {
    UserRef {
        id: user.id.0 as i64,
        display_name: user
            .username
            .clone()
            .unwrap_or_else(|| user.first_name.clone()),
        is_bot: user.is_bot,
    }
}

/// The chat, narrowed to the forum topic the message was posted in.
fn conversation_of(msg: &Message) -> Conversation {
    match msg.thread_id {
        Some(thread) if msg.is_topic_message => Conversation::thread(msg.chat.id.0, thread.0 .0),
        _ => Conversation::chat(msg.chat.id.0),
    }
}

/// Parse the `/create_issue` argument.
fn parse_mode(arg: &str) -> Option<SessionMode> {
    match arg.trim().to_ascii_lowercase().as_str() {
        "" => Some(SessionMode::Direct),
        "preview" => Some(SessionMode::Preview),
        _ => None,
    }
}

/// Parse the `/list_issues` argument into an optional login.
fn parse_assignee(arg: &str) -> Option<&str> {
    let login = arg.trim().trim_start_matches('@');
    (!login.is_empty()).then_some(login)
}

/// Handle the /start command.
pub async fn handle_start(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let welcome = format!(
        "Welcome to Issue Scribe! 📝\n\n\
        I turn notes and screenshots into tracker issues.\n\n\
        <b>Getting Started:</b>\n\
        1. Send /create_issue (or <code>/create_issue preview</code> to review first)\n\
        2. Send text and screenshots, then press Done\n\
        3. Use /list_issues to see what is open on the board\n\n\
        <b>Filing to:</b> <code>{}</code> (project #{})\n\n\
        Type /help for all commands.",
        html_escape(&state.info.repository),
        state.info.project_number
    );

    bot.send_message(msg.chat.id, welcome)
        .parse_mode(teloxide::types::ParseMode::Html)
        .await?;

    info!(chat_id = %msg.chat.id, user = ?msg.from.as_ref().map(|u| &u.username), "User started bot");
    Ok(())
}

/// Handle the /help command.
pub async fn handle_help(bot: Bot, msg: Message) -> ResponseResult<()> {
    let help_text = Command::descriptions().to_string();
    bot.send_message(msg.chat.id, help_text).await?;
    Ok(())
}

/// Handle the /test command.
pub async fn handle_test(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let status = format!(
        "✅ Issue Scribe is running.\n\n\
        <b>Tracker:</b> <code>{}</code> (project #{})\n\
        <b>Model:</b> <code>{}</code>\n\
        <b>Active sessions:</b> {}",
        html_escape(&state.info.repository),
        state.info.project_number,
        html_escape(&state.info.model),
        state.hub.active_sessions().await
    );

    let mut req = bot
        .send_message(msg.chat.id, status)
        .parse_mode(teloxide::types::ParseMode::Html);
    if let Some(thread) = msg.thread_id.filter(|_| msg.is_topic_message) {
        req = req.message_thread_id(thread);
    }
    req.await?;
    Ok(())
}

/// Handle /create_issue: start a session in its own task.
pub async fn handle_create_issue(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    arg: String,
) -> ResponseResult<()> {
    let Some(mode) = parse_mode(&arg) else {
        bot.send_message(
            msg.chat.id,
            "Usage: <code>/create_issue</code> or <code>/create_issue preview</code>",
        )
        .parse_mode(teloxide::types::ParseMode::Html)
        .await?;
        return Ok(());
    };
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let owner = user_ref(user);
    let origin = conversation_of(&msg);
    let forum = msg.chat.is_forum();
    info!(chat_id = %msg.chat.id, user = owner.id, mode = ?mode, forum, "Create issue requested");

    tokio::spawn(run_session(Arc::clone(&state), owner, origin, forum, mode));
    Ok(())
}

/// Handle /list_issues.
pub async fn handle_list_issues(
    msg: Message,
    state: Arc<BotState>,
    arg: String,
) -> ResponseResult<()> {
    let conversation = conversation_of(&msg);
    present_listing(&state, conversation, parse_assignee(&arg), 0, None).await;
    Ok(())
}

/// Route button presses: session decisions to the hub, page buttons to the listing.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    let Some(data) = q.data.as_deref().and_then(CallbackData::parse) else {
        debug!(data = ?q.data, "Unrecognized callback data");
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let (session_id, action) = match data {
        CallbackData::CollectDone(id) => (id, SessionAction::CollectDone),
        CallbackData::Review(id, decision) => (id, SessionAction::Review(decision)),
        CallbackData::ListPage { page, assignee } => {
            bot.answer_callback_query(q.id.clone()).await?;
            let Some(message) = q.regular_message() else {
                return Ok(());
            };
            let conversation = conversation_of(message);
            present_listing(&state, conversation, assignee.as_deref(), page, Some(message.id.0)).await;
            return Ok(());
        }
    };

    let event = CallbackEvent {
        callback_id: q.id.0.clone(),
        user_id: q.from.id.0 as i64,
        action,
    };
    if !state.hub.dispatch_callback(&session_id, event).await {
        bot.answer_callback_query(q.id.clone())
            .text("This session has ended.")
            .await?;
    }
    Ok(())
}

/// Forward non-command messages to sessions collecting in that conversation.
pub async fn handle_message(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let conversation = conversation_of(&msg);
    if !state.hub.is_listening(conversation).await {
        return Ok(());
    }
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let (image_urls, unresolved_images) = resolve_images(bot, &msg).await;
    let inbound = InboundMessage {
        conversation,
        message_id: msg.id.0,
        author: user_ref(user),
        text: msg.text().or_else(|| msg.caption()).map(str::to_string),
        image_urls,
        unresolved_images,
    };
    let delivered = state.hub.dispatch_message(inbound).await;
    debug!(chat_id = %msg.chat.id, message_id = msg.id.0, delivered, "Message routed to sessions");
    Ok(())
}

/// Resolve attached photos and image documents to URLs.
///
/// Returns the URLs and the number of attachments that could not be resolved;
/// the session reports those to the owner.
async fn resolve_images(bot: Bot, msg: &Message) -> (Vec<String>, usize) {
    let mut file_ids = Vec::new();
    // sizes are ordered smallest first
    if let Some(largest) = msg.photo().and_then(|sizes| sizes.last()) {
        file_ids.push(largest.file.id.clone());
    }
    if let Some(doc) = msg.document() {
        let is_image = doc
            .mime_type
            .as_ref()
            .is_some_and(|m| m.essence_str().starts_with("image/"));
        if is_image {
            file_ids.push(doc.file.id.clone());
        }
    }

    let transport = TelegramTransport::new(bot);
    let mut urls = Vec::with_capacity(file_ids.len());
    let mut unresolved = 0;
    for file_id in file_ids {
        match transport.file_url(file_id).await {
            Ok(url) => urls.push(url),
            Err(e) => {
                warn!(chat_id = %msg.chat.id, message_id = msg.id.0, error = %e, "Attachment could not be resolved");
                unresolved += 1;
            }
        }
    }
    (urls, unresolved)
}

/// Dispatch commands to appropriate handlers.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    match cmd {
        Command::Start => handle_start(bot, msg, state).await,
        Command::Help => handle_help(bot, msg).await,
        Command::CreateIssue(arg) => handle_create_issue(bot, msg, state, arg).await,
        Command::ListIssues(arg) => handle_list_issues(msg, state, arg).await,
        Command::Test => handle_test(bot, msg, state).await,
    }
}
