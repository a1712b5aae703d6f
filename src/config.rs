use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Discourse feed
    pub discourse_url: String,
    pub post_limit: usize,
    pub page_delay: Duration,

    // Keyword matching
    pub keywords: Vec<String>,

    // Telegram delivery
    pub telegram_api_url: String,
    pub telegram_bot_token: String,
    pub telegram_chat_id: i64,
    pub send_delay: Duration,

    // Checkpoint
    pub checkpoint_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Discourse feed
            discourse_url: required_env("DISCOURSE_URL")?
                .trim_end_matches('/')
                .to_string(),
            post_limit: parse_env_usize("POST_LIMIT", 5000)?,
            page_delay: Duration::from_secs(parse_env_u64("PAGE_DELAY_SECS", 1)?),

            // Keyword matching
            keywords: parse_keywords(&required_env("KEYWORDS")?),

            // Telegram delivery
            telegram_api_url: env_or_default("TELEGRAM_API_URL", "https://api.telegram.org")
                .trim_end_matches('/')
                .to_string(),
            telegram_bot_token: required_env("TELEGRAM_BOT_TOKEN")?,
            telegram_chat_id: parse_required_i64("TELEGRAM_CHAT_ID")?,
            send_delay: Duration::from_secs(parse_env_u64("SEND_DELAY_SECS", 5)?),

            // Checkpoint
            checkpoint_path: PathBuf::from(env_or_default("CHECKPOINT_PATH", "./last_post_id.txt")),
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discourse_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "DISCOURSE_URL".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if url::Url::parse(&self.discourse_url).is_err() {
            return Err(ConfigError::InvalidValue {
                name: "DISCOURSE_URL".to_string(),
                message: format!("not a valid URL: '{}'", self.discourse_url),
            });
        }
        if self.telegram_bot_token.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "TELEGRAM_BOT_TOKEN".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.keywords.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "KEYWORDS".to_string(),
                message: "must contain at least one keyword".to_string(),
            });
        }
        if self.post_limit == 0 {
            return Err(ConfigError::InvalidValue {
                name: "POST_LIMIT".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Configuration with harmless defaults for use in tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            discourse_url: "http://127.0.0.1:0".to_string(),
            post_limit: 5000,
            page_delay: Duration::ZERO,
            keywords: vec!["keyword".to_string()],
            telegram_api_url: "http://127.0.0.1:0".to_string(),
            telegram_bot_token: "test-token".to_string(),
            telegram_chat_id: 1,
            send_delay: Duration::ZERO,
            checkpoint_path: PathBuf::from("./last_post_id.txt"),
        }
    }
}

/// Split a comma-separated keyword list, dropping empty entries.
fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_required_i64(name: &str) -> Result<i64, ConfigError> {
    required_env(name)?
        .parse()
        .map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        })
}
