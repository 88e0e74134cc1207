//! Telegram bot interface for Issue Scribe.
//!
//! Users describe problems in a chat with text and screenshots; the bot turns
//! them into structured issues with an LLM and files them on GitHub.
//!
//! # Features
//!
//! - Collection sessions with a bounded input window
//! - Streaming generation with in-place progress updates
//! - Optional review loop (confirm, edit, cancel) before filing
//! - Project board listing with page buttons
//!
//! # Example
//!
//! ```no_run
//! use scribe_core::ScribeConfig;
//! use scribe_telegram::ScribeBot;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScribeConfig::from_env()?;
//!     let bot = ScribeBot::new(&config)?;
//!     bot.start_polling().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Commands
//!
//! - `/start` - Welcome message
//! - `/help` - Show available commands
//! - `/create_issue [preview]` - Collect input and file issues
//! - `/list_issues [assignee]` - List open board items
//! - `/test` - Liveness check

pub mod bot;
pub mod callback;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod listing;
pub mod render;
pub mod session;
pub mod state;
pub mod transport;

pub use bot::ScribeBot;
pub use callback::{CallbackData, ReviewDecision};
pub use error::{BotError, Result};
pub use hub::{CallbackEvent, CollectorHub, InboundEvent, SessionAction};
pub use listing::{present_listing, show_listing};
pub use session::run_session;
pub use state::{create_shared_state, BotState, ServiceInfo, SessionSettings};
pub use transport::{Button, ChatTransport, Keyboard, TelegramTransport};
