//! Monitor configuration
//!
//! Every setting comes from an environment variable. A `.env` file in the
//! working directory is consulted as well, the real environment taking
//! precedence. Empty values count as unset.

use std::path::PathBuf;
use std::time::Duration;

use crate::monitor::DEFAULT_COOLDOWN_MINUTES;

pub const DEFAULT_HEARTBEAT_FILE: &str = ".heartbeat";
pub const DEFAULT_THROTTLE_FILE: &str = ".properties";
pub const STATUS_FILE_SUFFIX: &str = ".last-status";

/// Complete configuration of one monitored target
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Base URL of the monitored API
    pub base_url: String,
    /// Path of the settings endpoint carrying the heartbeat
    pub settings_endpoint: String,
    /// Path of the OAuth token endpoint
    pub oauth_endpoint: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
    pub http_timeout: Duration,
    pub heartbeat_file: PathBuf,
    pub status_file: PathBuf,
    pub throttle_file: PathBuf,
    /// Lock file around the whole run, disabled when `None`
    pub lock_file: Option<PathBuf>,
    pub slack: SlackConfig,
    /// Prefix messages with a channel-wide mention
    pub broadcast: bool,
    pub cooldown_minutes: u32,
    /// Extra log destination besides stderr
    pub log_file: Option<PathBuf>,
}

/// Slack incoming webhook settings
#[derive(Debug, Clone)]
pub struct SlackConfig {
    /// Notifications are only logged when unset
    pub webhook_url: Option<String>,
    pub username: String,
    pub emoji_beating: String,
    pub emoji_stopped: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            username: "heartbeat_monitor".to_string(),
            emoji_beating: ":heart:".to_string(),
            emoji_stopped: ":heart:".to_string(),
        }
    }
}

impl MonitorConfig {
    /// Configuration with defaults for everything but the API base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let heartbeat_file = PathBuf::from(DEFAULT_HEARTBEAT_FILE);
        Self {
            base_url: base_url.into(),
            settings_endpoint: "/settings".to_string(),
            oauth_endpoint: "/oauth/token".to_string(),
            client_id: "store-front".to_string(),
            client_secret: String::new(),
            scope: "store-front-guest".to_string(),
            http_timeout: Duration::from_secs(30),
            status_file: status_file_for(&heartbeat_file),
            heartbeat_file,
            throttle_file: PathBuf::from(DEFAULT_THROTTLE_FILE),
            lock_file: None,
            slack: SlackConfig::default(),
            broadcast: true,
            cooldown_minutes: DEFAULT_COOLDOWN_MINUTES,
            log_file: None,
        }
    }

    /// Load from `.env` and the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = get("APP_URL").ok_or(ConfigError::Missing("APP_URL"))?;
        let mut config = Self::new(base_url);

        if let Some(v) = get("SETTINGS_ENDPOINT") {
            config.settings_endpoint = v;
        }
        if let Some(v) = get("OAUTH_ENDPOINT") {
            config.oauth_endpoint = v;
        }
        if let Some(v) = get("OAUTH_CLIENT_ID") {
            config.client_id = v;
        }
        if let Some(v) = get("STORE_FRONT_CLIENT_SECRET") {
            config.client_secret = v;
        }
        if let Some(v) = get("OAUTH_SCOPE") {
            config.scope = v;
        }
        if let Some(v) = get("HTTP_TIMEOUT_SECS") {
            config.http_timeout = Duration::from_secs(parse_number("HTTP_TIMEOUT_SECS", &v)?);
        }

        if let Some(v) = get("TIMESTAMP_FILE") {
            config.heartbeat_file = PathBuf::from(v);
        }
        config.status_file = match get("STATUS_FILE") {
            Some(v) => PathBuf::from(v),
            None => status_file_for(&config.heartbeat_file),
        };
        if let Some(v) = get("PROPERTIES_FILE") {
            config.throttle_file = PathBuf::from(v);
        }
        config.lock_file = get("LOCK_FILE").map(PathBuf::from);

        config.slack.webhook_url = get("SLACK_WEBHOOK_URL");
        if let Some(v) = get("SLACK_USERNAME") {
            config.slack.username = v;
        }
        if let Some(v) = get("SLACK_EMOJI_BEATING") {
            config.slack.emoji_beating = v;
        }
        if let Some(v) = get("SLACK_EMOJI_STOPPED") {
            config.slack.emoji_stopped = v;
        }
        if let Some(v) = get("SLACK_BROADCAST") {
            config.broadcast = parse_bool("SLACK_BROADCAST", &v)?;
        }

        if let Some(v) = get("COOLDOWN_MINUTES") {
            config.cooldown_minutes = parse_number("COOLDOWN_MINUTES", &v)?;
        }
        config.log_file = get("HEARTBEAT_LOG_FILE").map(PathBuf::from);

        Ok(config)
    }
}

/// Status file sitting next to the heartbeat file
pub fn status_file_for(heartbeat_file: &std::path::Path) -> PathBuf {
    let mut name = heartbeat_file.as_os_str().to_os_string();
    name.push(STATUS_FILE_SUFFIX);
    PathBuf::from(name)
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}
