//! Main Telegram bot implementation.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};

use scribe_completion::{HttpImageFetcher, OpenRouterClient};
use scribe_core::ScribeConfig;
use scribe_tracker::GithubTracker;

use crate::error::{BotError, Result};
use crate::handlers::{handle_callback, handle_command, handle_message, Command};
use crate::state::{create_shared_state, BotState, ServiceInfo, SessionSettings};
use crate::transport::TelegramTransport;

/// The Issue Scribe Telegram bot.
pub struct ScribeBot {
    /// The teloxide bot instance.
    bot: Bot,
    /// Shared state across handlers.
    state: Arc<BotState>,
}

impl ScribeBot {
    /// Build the bot and its clients from configuration.
    pub fn new(config: &ScribeConfig) -> Result<Self> {
        let bot = Bot::new(&config.telegram_token);

        let tracker = GithubTracker::new(&config.github)?;
        let completion = OpenRouterClient::new(&config.openrouter);
        let info = ServiceInfo {
            repository: tracker.repository(),
            project_number: config.github.project_number,
            model: completion.model().to_string(),
        };

        let state = create_shared_state(
            Arc::new(TelegramTransport::new(bot.clone())),
            Arc::new(completion),
            Arc::new(HttpImageFetcher::new()),
            Arc::new(tracker),
            SessionSettings::from_config(config),
            info,
        );

        Ok(Self { bot, state })
    }

    /// Get the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| BotError::BotStartFailed(e.to_string()))?;
        Ok(me.username().to_string())
    }

    /// Start the bot in polling mode.
    pub async fn start_polling(&self) -> Result<()> {
        info!("Starting Telegram bot in polling mode...");

        if let Err(e) = self.bot.set_my_commands(Command::bot_commands()).await {
            warn!(error = %e, "Could not register command list");
        }

        let bot = self.bot.clone();
        let state_for_commands = Arc::clone(&self.state);
        let state_for_messages = Arc::clone(&self.state);
        let state_for_callbacks = Arc::clone(&self.state);

        let handler = dptree::entry()
            .branch(
                Update::filter_callback_query()
                    .endpoint(move |bot: Bot, q: CallbackQuery| {
                        let state = Arc::clone(&state_for_callbacks);
                        async move { handle_callback(bot, q, state).await }
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                        let state = Arc::clone(&state_for_commands);
                        info!(chat_id = %msg.chat.id, "Command matched: {:?}", cmd);
                        async move { handle_command(bot, msg, cmd, state).await }
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| {
                        // Unrecognized commands (start with / but didn't parse)
                        msg.text().is_some_and(|t| t.starts_with('/'))
                    })
                    .endpoint(|bot: Bot, msg: Message| async move {
                        if let Some(text) = msg.text() {
                            info!(cmd = %text, "Unrecognized command");
                            bot.send_message(
                                msg.chat.id,
                                format!(
                                    "Unknown command: {}\n\nUse /help to see available commands.",
                                    text.split_whitespace().next().unwrap_or(text)
                                ),
                            )
                            .await?;
                        }
                        Ok(())
                    }),
            )
            .branch(
                // Text, captions, photos and image documents feed open sessions
                Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
                    let state = Arc::clone(&state_for_messages);
                    async move { handle_message(bot, msg, state).await }
                }),
            );

        info!("Bot is running! Send /create_issue to begin.");

        Dispatcher::builder(bot, handler)
            .default_handler(|upd| async move {
                tracing::debug!("Unhandled update: {:?}", upd.kind);
            })
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}
