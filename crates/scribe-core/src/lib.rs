//! Scribe Core - shared business logic for Issue Scribe.
//!
//! This crate holds everything that does not talk to the network:
//!
//! - **config**: Environment-driven configuration and state directory paths
//! - **validator**: Schema checks on completion output before it is trusted
//! - **prompt**: The system instruction and issue templates sent to the model
//! - **listing**: The read-only projection behind the issue listing command
//! - **throttle**: When to republish in-progress generation output
//! - **text**: Small text helpers shared by renderers

pub mod config;
pub mod error;
pub mod listing;
pub mod prompt;
pub mod text;
pub mod throttle;
pub mod validator;

// Re-export commonly used items for convenience
pub use config::{
    config_dir, env_file, state_dir, GithubSettings, OpenRouterSettings, OwnerKind,
    ReviewTimeoutPolicy, ScribeConfig, WindowSettings,
};
pub use error::{CoreError, Result};
pub use listing::{
    paginate, project_items, ItemSummary, ListingPage, BODY_PREVIEW_CHARS, LISTING_PAGE_SIZE,
};
pub use prompt::{system_prompt, user_text, IssueTemplate};
pub use text::{html_escape, truncate_chars, truncate_tail};
pub use throttle::{CharCadence, RenderThrottle};
pub use validator::{
    validate_issues, Problem, ValidationError, LABEL_MAX_CHARS, LABEL_MIN_CHARS, MIN_BODY_CHARS,
    MIN_TITLE_CHARS,
};
