//! Chat transport: the outbound side of the bot.
//!
//! Sessions and the listing command only see [`ChatTransport`]. Messages are
//! HTML formatted. [`TelegramTransport`] implements it with teloxide.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    FileId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode, ThreadId,
};
use tracing::debug;

use scribe_models::Conversation;

use crate::error::Result;

/// An inline button: label and callback data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Rows of inline buttons.
pub type Keyboard = Vec<Vec<Button>>;

/// Send / edit / answer primitives the bot's flows are written against.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Post a message, returning its id.
    async fn send(
        &self,
        conversation: Conversation,
        html: &str,
        buttons: Option<Keyboard>,
    ) -> Result<i32>;

    /// Replace a message's text. `None` buttons removes the keyboard.
    async fn edit(
        &self,
        conversation: Conversation,
        message_id: i32,
        html: &str,
        buttons: Option<Keyboard>,
    ) -> Result<()>;

    /// Acknowledge a button press, optionally with a toast.
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()>;

    /// Open a thread (forum topic) in a chat.
    async fn open_thread(&self, chat_id: i64, title: &str) -> Result<Conversation>;
}

/// teloxide-backed transport.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Resolve an attachment to a downloadable URL.
    ///
    /// The URL embeds the bot token; never log it.
    pub async fn file_url(&self, file_id: FileId) -> Result<String> {
        let file = self.bot.get_file(file_id).await?;
        Ok(format!(
            "{}file/bot{}/{}",
            self.bot.api_url(),
            self.bot.token(),
            file.path
        ))
    }
}

fn markup(keyboard: Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.into_iter().map(|row| {
        row.into_iter()
            .map(|b| InlineKeyboardButton::callback(b.label, b.data))
            .collect::<Vec<_>>()
    }))
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send(
        &self,
        conversation: Conversation,
        html: &str,
        buttons: Option<Keyboard>,
    ) -> Result<i32> {
        let mut req = self
            .bot
            .send_message(ChatId(conversation.chat_id), html)
            .parse_mode(ParseMode::Html);
        if let Some(tid) = conversation.thread_id {
            req = req.message_thread_id(ThreadId(MessageId(tid)));
        }
        if let Some(kb) = buttons {
            req = req.reply_markup(markup(kb));
        }
        let sent = req.await?;
        Ok(sent.id.0)
    }

    async fn edit(
        &self,
        conversation: Conversation,
        message_id: i32,
        html: &str,
        buttons: Option<Keyboard>,
    ) -> Result<()> {
        let mut req = self
            .bot
            .edit_message_text(ChatId(conversation.chat_id), MessageId(message_id), html)
            .parse_mode(ParseMode::Html);
        if let Some(kb) = buttons {
            req = req.reply_markup(markup(kb));
        }
        req.await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let mut req = self.bot.answer_callback_query(teloxide::types::CallbackQueryId(callback_id.to_string()));
        if let Some(text) = text {
            req = req.text(text);
        }
        req.await?;
        Ok(())
    }

    async fn open_thread(&self, chat_id: i64, title: &str) -> Result<Conversation> {
        let topic = self.bot.create_forum_topic(ChatId(chat_id), title).await?;
        let thread_id = topic.thread_id.0 .0;
        debug!(chat_id, thread_id, "Forum topic opened");
        Ok(Conversation::thread(chat_id, thread_id))
    }
}
