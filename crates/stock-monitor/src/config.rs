//! Configuration loaded from environment variables.

use std::collections::HashSet;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use database::sqlite_url_from_path;

use crate::detector::DetectorConfig;

/// Default page to monitor.
pub const DEFAULT_SOURCE_URL: &str = "https://www.sheinindia.in/c/sverse-5939-37961";

/// Monitor configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bot token.
    pub telegram_bot_token: String,
    /// Bot API base URL.
    pub telegram_api_url: String,
    /// Time between scheduled checks.
    pub poll_interval: Duration,
    /// Thresholds, floor and dedup window.
    pub detector: DetectorConfig,
    /// Telegram user IDs allowed to run admin commands.
    pub admin_user_ids: HashSet<String>,
    /// Category page to scrape.
    pub source_url: String,
    /// SQLite database URL.
    pub database_url: String,
    /// Chat that receives per-alert delivery reports.
    pub operator_chat_id: String,
    /// Pause between broadcast sends.
    pub broadcast_delay: Duration,
    /// Broadcast a test notification when the process starts.
    pub announce_on_startup: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `TELEGRAM_BOT_TOKEN` | Bot token | (required) |
    /// | `TELEGRAM_API_URL` | Bot API base URL | `https://api.telegram.org` |
    /// | `POLL_INTERVAL_SECONDS` | Seconds between checks | `2` |
    /// | `MIN_STOCK_FLOOR` | Minimum men's count for an alert | `1` |
    /// | `THRESHOLD_MEN` | Men's increase that triggers an alert | `2` |
    /// | `THRESHOLD_WOMEN` | Women's increase that triggers an alert | `50` |
    /// | `ADMIN_USER_IDS` | Comma-separated admin user IDs | (empty) |
    /// | `SOURCE_URL` | Category page to scrape | sverse listing |
    /// | `SQLITE_PATH` | SQLite path or URL | `./data/stock_monitor.db` |
    /// | `OPERATOR_CHAT_ID` | Chat for delivery reports | (required) |
    /// | `DEDUP_WINDOW_SECONDS` | Repeat-alert suppression window | `3600` |
    /// | `BROADCAST_DELAY_MS` | Pause between broadcast sends | `100` |
    /// | `ANNOUNCE_ON_STARTUP` | Broadcast a test notification on start | `true` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let telegram_bot_token =
            get("TELEGRAM_BOT_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;
        let operator_chat_id =
            get("OPERATOR_CHAT_ID").ok_or(ConfigError::Missing("OPERATOR_CHAT_ID"))?;

        let telegram_api_url = get("TELEGRAM_API_URL")
            .unwrap_or_else(|| telegram_client::config::DEFAULT_API_URL.to_string());

        let poll_seconds: u64 = parse_or(&get, "POLL_INTERVAL_SECONDS", 2)?;
        if poll_seconds == 0 {
            return Err(ConfigError::Invalid("POLL_INTERVAL_SECONDS"));
        }

        let defaults = DetectorConfig::default();
        let detector = DetectorConfig {
            men_threshold: parse_or(&get, "THRESHOLD_MEN", defaults.men_threshold)?,
            women_threshold: parse_or(&get, "THRESHOLD_WOMEN", defaults.women_threshold)?,
            min_stock_floor: parse_or(&get, "MIN_STOCK_FLOOR", defaults.min_stock_floor)?,
            dedup_window: Duration::from_secs(parse_or(
                &get,
                "DEDUP_WINDOW_SECONDS",
                defaults.dedup_window.as_secs(),
            )?),
        };

        let admin_user_ids = get("ADMIN_USER_IDS")
            .map(|ids| {
                ids.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let source_url = get("SOURCE_URL").unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string());
        let database_url = sqlite_url_from_path(
            &get("SQLITE_PATH").unwrap_or_else(|| "./data/stock_monitor.db".to_string()),
        );

        let broadcast_delay = Duration::from_millis(parse_or(&get, "BROADCAST_DELAY_MS", 100)?);
        let announce_on_startup = match get("ANNOUNCE_ON_STARTUP") {
            Some(value) => !matches!(value.to_lowercase().as_str(), "false" | "0" | "no"),
            None => true,
        };

        Ok(Self {
            telegram_bot_token,
            telegram_api_url,
            poll_interval: Duration::from_secs(poll_seconds),
            detector,
            admin_user_ids,
            source_url,
            database_url,
            operator_chat_id,
            broadcast_delay,
            announce_on_startup,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("Invalid value for {0}")]
    Invalid(&'static str),
}
