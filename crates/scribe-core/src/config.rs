//! Shared configuration for Issue Scribe.
//!
//! Configuration comes from environment variables. The binary loads an env
//! file from the config directory first (see [`env_file`]), then `.env.local`
//! or `.env` in the working directory, so secrets never need to be exported in
//! the shell.
//!
//! # Storage Structure
//!
//! ```text
//! ~/.issue-scribe/
//! └── config/
//!     └── .env.local    # Secrets (bot token, API keys)
//! ```
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//! - `GITHUB_TOKEN`: Token with issue and project read access
//! - `GITHUB_OWNER`, `GITHUB_REPO`: Repository issues are filed against
//! - `GITHUB_PROJECT_NUMBER`: Project board used by the listing command
//! - `OPENROUTER_API_KEY`: Completion API key
//!
//! Optional:
//! - `GITHUB_OWNER_KIND`: `organization` (default) or `user`
//! - `GITHUB_API_URL`: REST/GraphQL base (default: https://api.github.com)
//! - `OPENROUTER_MODEL`: Model to use (default: anthropic/claude-sonnet-4)
//! - `OPENROUTER_API_URL`: Chat completions endpoint
//! - `SCRIBE_COLLECT_WINDOW_SECS`: Collection window (default: 600)
//! - `SCRIBE_REVIEW_WINDOW_SECS`: Review window (default: 300)
//! - `SCRIBE_EDIT_WINDOW_SECS`: Edit window (default: 120)
//! - `SCRIBE_RENDER_EVERY_CHARS`: Progress re-render cadence (default: 400)
//! - `SCRIBE_REVIEW_TIMEOUT`: `silent` (default) or `notify`
//! - `SCRIBE_STATE_DIR`: Override the base state directory

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::{CoreError, Result};

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "SCRIBE_STATE_DIR";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".issue-scribe";

const CONFIG_SUBDIR: &str = "config";

/// Default completion model.
pub const DEFAULT_MODEL: &str = "anthropic/claude-sonnet-4";

/// Default OpenRouter chat completions endpoint.
pub const DEFAULT_OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default GitHub API base.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

const DEFAULT_COLLECT_WINDOW_SECS: u64 = 600;
const DEFAULT_REVIEW_WINDOW_SECS: u64 = 300;
const DEFAULT_EDIT_WINDOW_SECS: u64 = 120;
const DEFAULT_RENDER_EVERY_CHARS: usize = 400;

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Get the Issue Scribe state directory.
///
/// The state directory is determined by:
/// 1. `SCRIBE_STATE_DIR` environment variable if set
/// 2. `~/.issue-scribe` if home directory is available
/// 3. `.issue-scribe` in current directory as fallback
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| {
            std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_STATE_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
                })
        })
        .clone()
}

/// Get the user config directory.
pub fn config_dir() -> PathBuf {
    state_dir().join(CONFIG_SUBDIR)
}

/// Get the .env.local file path holding secrets.
pub fn env_file() -> PathBuf {
    config_dir().join(".env.local")
}

/// Whether the project board belongs to an organization or a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OwnerKind {
    #[default]
    Organization,
    User,
}

impl FromStr for OwnerKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "organization" | "org" => Ok(Self::Organization),
            "user" => Ok(Self::User),
            other => Err(format!("expected 'organization' or 'user', got '{}'", other)),
        }
    }
}

/// What happens when the review window lapses without a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewTimeoutPolicy {
    /// Disable the buttons and say nothing.
    #[default]
    Silent,
    /// Disable the buttons and post a cancellation notice, like an explicit cancel.
    Notify,
}

impl FromStr for ReviewTimeoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "silent" => Ok(Self::Silent),
            "notify" | "cancel" => Ok(Self::Notify),
            other => Err(format!("expected 'silent' or 'notify', got '{}'", other)),
        }
    }
}

/// Tracker connection settings.
#[derive(Clone)]
pub struct GithubSettings {
    pub token: String,
    pub api_url: String,
    pub owner: String,
    pub repo: String,
    pub owner_kind: OwnerKind,
    pub project_number: u64,
}

/// Completion API settings.
#[derive(Clone)]
pub struct OpenRouterSettings {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
}

/// Durations of the session windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSettings {
    /// Free-form collection window.
    pub collect: Duration,
    /// Confirm / edit / cancel decision window.
    pub review: Duration,
    /// Single-message edit window.
    pub edit: Duration,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            collect: Duration::from_secs(DEFAULT_COLLECT_WINDOW_SECS),
            review: Duration::from_secs(DEFAULT_REVIEW_WINDOW_SECS),
            edit: Duration::from_secs(DEFAULT_EDIT_WINDOW_SECS),
        }
    }
}

/// Complete process configuration.
#[derive(Clone)]
pub struct ScribeConfig {
    pub telegram_token: String,
    pub github: GithubSettings,
    pub openrouter: OpenRouterSettings,
    pub windows: WindowSettings,
    pub render_every_chars: usize,
    pub review_timeout: ReviewTimeoutPolicy,
}

impl ScribeConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |name: &'static str| get(name).ok_or(CoreError::MissingEnv(name));

        let github = GithubSettings {
            token: required("GITHUB_TOKEN")?,
            api_url: get("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            owner: required("GITHUB_OWNER")?,
            repo: required("GITHUB_REPO")?,
            owner_kind: parse_optional(&get, "GITHUB_OWNER_KIND")?.unwrap_or_default(),
            project_number: parse_required(&get, "GITHUB_PROJECT_NUMBER")?,
        };

        let openrouter = OpenRouterSettings {
            api_key: required("OPENROUTER_API_KEY")?,
            api_url: get("OPENROUTER_API_URL")
                .unwrap_or_else(|| DEFAULT_OPENROUTER_API_URL.to_string()),
            model: get("OPENROUTER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        };

        let defaults = WindowSettings::default();
        let secs = |name: &'static str, fallback: Duration| -> Result<Duration> {
            Ok(parse_optional::<u64, _>(&get, name)?
                .map(Duration::from_secs)
                .unwrap_or(fallback))
        };
        let windows = WindowSettings {
            collect: secs("SCRIBE_COLLECT_WINDOW_SECS", defaults.collect)?,
            review: secs("SCRIBE_REVIEW_WINDOW_SECS", defaults.review)?,
            edit: secs("SCRIBE_EDIT_WINDOW_SECS", defaults.edit)?,
        };

        Ok(Self {
            telegram_token: required("TELEGRAM_BOT_TOKEN")?,
            github,
            openrouter,
            windows,
            render_every_chars: parse_optional(&get, "SCRIBE_RENDER_EVERY_CHARS")?
                .unwrap_or(DEFAULT_RENDER_EVERY_CHARS)
                .max(1),
            review_timeout: parse_optional(&get, "SCRIBE_REVIEW_TIMEOUT")?.unwrap_or_default(),
        })
    }
}

fn parse_optional<T, G>(get: &G, name: &'static str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(name)
        .map(|value| {
            value.parse::<T>().map_err(|e| CoreError::InvalidEnv {
                name,
                value: value.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn parse_required<T, G>(get: &G, name: &'static str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    parse_optional(get, name)?.ok_or(CoreError::MissingEnv(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("GITHUB_TOKEN", "ghp_test"),
            ("GITHUB_OWNER", "acme"),
            ("GITHUB_REPO", "widgets"),
            ("GITHUB_PROJECT_NUMBER", "4"),
            ("OPENROUTER_API_KEY", "or-key"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<ScribeConfig> {
        ScribeConfig::from_lookup(|name| env.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults_applied() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.github.owner, "acme");
        assert_eq!(config.github.project_number, 4);
        assert_eq!(config.github.owner_kind, OwnerKind::Organization);
        assert_eq!(config.github.api_url, DEFAULT_GITHUB_API_URL);
        assert_eq!(config.openrouter.model, DEFAULT_MODEL);
        assert_eq!(config.windows, WindowSettings::default());
        assert_eq!(config.windows.collect, Duration::from_secs(600));
        assert_eq!(config.render_every_chars, 400);
        assert_eq!(config.review_timeout, ReviewTimeoutPolicy::Silent);
    }

    #[test]
    fn test_missing_credential_is_an_error() {
        let mut env = base_env();
        env.remove("GITHUB_TOKEN");
        let err = load(&env).err().unwrap();
        assert!(matches!(err, CoreError::MissingEnv("GITHUB_TOKEN")));

        let mut env = base_env();
        env.insert("OPENROUTER_API_KEY", "   ");
        let err = load(&env).err().unwrap();
        assert!(matches!(err, CoreError::MissingEnv("OPENROUTER_API_KEY")));
    }

    #[test]
    fn test_overrides() {
        let mut env = base_env();
        env.insert("GITHUB_OWNER_KIND", "user");
        env.insert("SCRIBE_COLLECT_WINDOW_SECS", "30");
        env.insert("SCRIBE_REVIEW_TIMEOUT", "notify");
        env.insert("SCRIBE_RENDER_EVERY_CHARS", "0");

        let config = load(&env).unwrap();
        assert_eq!(config.github.owner_kind, OwnerKind::User);
        assert_eq!(config.windows.collect, Duration::from_secs(30));
        assert_eq!(config.review_timeout, ReviewTimeoutPolicy::Notify);
        assert_eq!(config.render_every_chars, 1);
    }

    #[test]
    fn test_invalid_number() {
        let mut env = base_env();
        env.insert("GITHUB_PROJECT_NUMBER", "four");
        let err = load(&env).err().unwrap();
        assert!(matches!(
            err,
            CoreError::InvalidEnv { name: "GITHUB_PROJECT_NUMBER", .. }
        ));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "Silent".parse::<ReviewTimeoutPolicy>(),
            Ok(ReviewTimeoutPolicy::Silent)
        );
        assert!("loud".parse::<ReviewTimeoutPolicy>().is_err());
        assert_eq!("org".parse::<OwnerKind>(), Ok(OwnerKind::Organization));
    }

    #[test]
    fn test_env_file_name() {
        let file = env_file();
        assert!(file.ends_with(".env.local"));
        assert!(config_dir().ends_with("config"));
    }
}
