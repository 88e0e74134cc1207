//! Shared state handed to every handler and session task.

use std::sync::Arc;

use scribe_completion::{CompletionClient, ImageFetcher};
use scribe_core::{CharCadence, RenderThrottle, ReviewTimeoutPolicy, ScribeConfig, WindowSettings};
use scribe_tracker::IssueTracker;

use crate::hub::CollectorHub;
use crate::transport::ChatTransport;

/// Timing and rendering knobs of a session.
#[derive(Clone)]
pub struct SessionSettings {
    pub windows: WindowSettings,
    pub review_timeout: ReviewTimeoutPolicy,
    pub throttle: Arc<dyn RenderThrottle>,
}

impl SessionSettings {
    pub fn from_config(config: &ScribeConfig) -> Self {
        Self {
            windows: config.windows,
            review_timeout: config.review_timeout,
            throttle: Arc::new(CharCadence(config.render_every_chars)),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            windows: WindowSettings::default(),
            review_timeout: ReviewTimeoutPolicy::default(),
            throttle: Arc::new(CharCadence(400)),
        }
    }
}

/// What `/test` and `/start` report about the wiring.
#[derive(Debug, Clone, Default)]
pub struct ServiceInfo {
    /// `owner/repo` issues are filed against.
    pub repository: String,
    /// Project board number used by the listing.
    pub project_number: u64,
    /// Completion model.
    pub model: String,
}

/// Client handles, routing table and settings shared across the bot.
pub struct BotState {
    pub transport: Arc<dyn ChatTransport>,
    pub completion: Arc<dyn CompletionClient>,
    pub images: Arc<dyn ImageFetcher>,
    pub tracker: Arc<dyn IssueTracker>,
    pub hub: CollectorHub,
    pub settings: SessionSettings,
    pub info: ServiceInfo,
}

impl BotState {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        completion: Arc<dyn CompletionClient>,
        images: Arc<dyn ImageFetcher>,
        tracker: Arc<dyn IssueTracker>,
        settings: SessionSettings,
        info: ServiceInfo,
    ) -> Self {
        Self {
            transport,
            completion,
            images,
            tracker,
            hub: CollectorHub::new(),
            settings,
            info,
        }
    }
}

/// Wrap state in an `Arc` for use across handlers.
pub fn create_shared_state(
    transport: Arc<dyn ChatTransport>,
    completion: Arc<dyn CompletionClient>,
    images: Arc<dyn ImageFetcher>,
    tracker: Arc<dyn IssueTracker>,
    settings: SessionSettings,
    info: ServiceInfo,
) -> Arc<BotState> {
    Arc::new(BotState::new(
        transport, completion, images, tracker, settings, info,
    ))
}
