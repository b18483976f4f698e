//! Configuration and settings management
//!
//! Loads settings from environment variables and defines transport constants.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_bot_token: String,
    /// X API v2 bearer token
    pub twitter_bearer_token: String,

    /// Base URL of the X API v2
    #[serde(default = "default_twitter_api_base_url")]
    pub twitter_api_base_url: String,
    /// Timeout for a single tweet lookup, in seconds
    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,

    /// Lookup attempts made while the X API keeps rate limiting
    #[serde(default = "default_rate_limit_max_attempts")]
    pub rate_limit_max_attempts: u32,
    /// Base backoff delay in seconds, multiplied by the attempt number
    #[serde(default = "default_rate_limit_base_delay_secs")]
    pub rate_limit_base_delay_secs: u64,
}

fn default_twitter_api_base_url() -> String {
    "https://api.twitter.com/2".to_string()
}

const fn default_lookup_timeout_secs() -> u64 {
    30
}

const fn default_rate_limit_max_attempts() -> u32 {
    3
}

const fn default_rate_limit_base_delay_secs() -> u64 {
    5
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use x_media_relay::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a required value is empty.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, never checked in
            .add_source(File::with_name("config/local").required(false))
            // Eg.. `APP__LOOKUP_TIMEOUT_SECS=10 ./target/app`
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Plain UPPER_SNAKE_CASE variables map onto snake_case fields
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        let settings: Self = s.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks values that deserialize fine but cannot run the bot.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` naming the offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram_bot_token.trim().is_empty() {
            return Err(ConfigError::Message(
                "TELEGRAM_BOT_TOKEN must not be empty".into(),
            ));
        }
        if self.twitter_bearer_token.trim().is_empty() {
            return Err(ConfigError::Message(
                "TWITTER_BEARER_TOKEN must not be empty".into(),
            ));
        }
        if self.rate_limit_max_attempts == 0 {
            return Err(ConfigError::Message(
                "RATE_LIMIT_MAX_ATTEMPTS must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// Telegram transport retry configuration
/// Initial backoff for retried Telegram sends
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Upper bound for a single Telegram send backoff
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;
/// Retries after the first failed Telegram send
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;
