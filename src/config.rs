//! Configuration for the relay.
//!
//! Everything has a working default, so the config file is optional: a
//! missing or empty file yields `Config::default()`. Environment variables
//! (`TELEGRAM_BOT_TOKEN`, `PORT`) override the file, and command-line flags
//! override both.
use secrecy::SecretString;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::limiter::RateLimitScope;
use crate::util::{validate_feed_url, UrlValidationError};

/// Habr's information-security hub feed
pub const DEFAULT_FEED_URL: &str = "https://habr.com/ru/rss/hub/infosecurity/all/?fl=ru";

/// Longest accepted dedup retention window (one year)
const MAX_RETENTION_HOURS: u64 = 24 * 365;

/// Longest accepted pause between cache sweeps (one week)
const MAX_SWEEP_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Token value used by local setups that want the web API only
const DUMMY_TOKEN: &str = "dummy_token_for_testing";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid feed URL: {0}")]
    FeedUrl(#[from] UrlValidationError),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level relay configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Custom Debug impl masks `telegram_bot_token`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The single feed every trigger reads.
    pub feed_url: String,

    /// Address the web server binds to.
    pub bind_address: String,

    /// Web server port. `PORT` env var takes precedence.
    pub port: u16,

    /// Directory served for every non-API path. Empty string disables it.
    pub static_dir: PathBuf,

    /// How long a delivered article id stays in the dedup cache.
    pub retention_hours: u64,

    /// Minutes between background sweeps of the dedup cache.
    pub sweep_interval_minutes: u64,

    /// Articles returned per pipeline cycle.
    pub max_results: usize,

    /// Feed request timeout in seconds.
    pub fetch_timeout_secs: u64,

    /// Pause after each article sent to a chat, in milliseconds.
    pub send_delay_ms: u64,

    /// One chat trigger is admitted per this many milliseconds.
    pub rate_limit_interval_ms: u64,

    /// Whether chats share one rate-limit bucket (`global`) or get their own (`per_chat`).
    pub rate_limit_scope: RateLimitScope,

    /// Telegram bot token. `TELEGRAM_BOT_TOKEN` env var takes precedence.
    pub telegram_bot_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            static_dir: PathBuf::from("docs"),
            retention_hours: 24,
            sweep_interval_minutes: 60,
            max_results: 10,
            fetch_timeout_secs: 30,
            send_delay_ms: 500,
            rate_limit_interval_ms: 1000,
            rate_limit_scope: RateLimitScope::Global,
            telegram_bot_token: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("feed_url", &self.feed_url)
            .field("bind_address", &self.bind_address)
            .field("port", &self.port)
            .field("static_dir", &self.static_dir)
            .field("retention_hours", &self.retention_hours)
            .field("sweep_interval_minutes", &self.sweep_interval_minutes)
            .field("max_results", &self.max_results)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("send_delay_ms", &self.send_delay_ms)
            .field("rate_limit_interval_ms", &self.rate_limit_interval_ms)
            .field("rate_limit_scope", &self.rate_limit_scope)
            .field(
                "telegram_bot_token",
                &self.telegram_bot_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 12] = [
        "feed_url",
        "bind_address",
        "port",
        "static_dir",
        "retention_hours",
        "sweep_interval_minutes",
        "max_results",
        "fetch_timeout_secs",
        "send_delay_ms",
        "rate_limit_interval_ms",
        "rate_limit_scope",
        "telegram_bot_token",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), feed = %config.feed_url, "Loaded configuration");
        Ok(config)
    }

    /// Applies `TELEGRAM_BOT_TOKEN` and `PORT` from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN") {
            self.telegram_bot_token = Some(token);
        }

        if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
            self.port = port.trim().parse().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                reason: format!("{port:?} is not a port number: {e}"),
            })?;
        }

        Ok(())
    }

    /// Checks cross-field constraints and returns the parsed feed URL.
    pub fn validate(&self) -> Result<Url, ConfigError> {
        let url = validate_feed_url(&self.feed_url)?;

        let positive = [
            ("retention_hours", self.retention_hours),
            ("sweep_interval_minutes", self.sweep_interval_minutes),
            ("max_results", self.max_results as u64),
            ("fetch_timeout_secs", self.fetch_timeout_secs),
            ("rate_limit_interval_ms", self.rate_limit_interval_ms),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        let bounded = [
            ("retention_hours", self.retention_hours, MAX_RETENTION_HOURS),
            (
                "sweep_interval_minutes",
                self.sweep_interval_minutes,
                MAX_SWEEP_INTERVAL_MINUTES,
            ),
        ];
        for (key, value, max) in bounded {
            if value > max {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("must be at most {max}"),
                });
            }
        }

        self.socket_addr()?;
        Ok(url)
    }

    /// The bot token, or `None` when the relay should run web-only.
    ///
    /// An empty token and the placeholder `dummy_token_for_testing` both
    /// count as absent.
    pub fn bot_token(&self) -> Option<SecretString> {
        self.telegram_bot_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != DUMMY_TOKEN)
            .map(|t| SecretString::from(t.to_string()))
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .bind_address
            .trim()
            .parse()
            .map_err(|e| ConfigError::Invalid {
                key: "bind_address",
                reason: format!("{e}"),
            })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn static_dir(&self) -> Option<&Path> {
        if self.static_dir.as_os_str().is_empty() {
            None
        } else {
            Some(&self.static_dir)
        }
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_hours.saturating_mul(3600))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_minutes.saturating_mul(60))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn send_delay(&self) -> Duration {
        Duration::from_millis(self.send_delay_ms)
    }

    pub fn rate_limit_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limit_interval_ms)
    }
}

// ============================================================================
// Tests
// ============================================================================
