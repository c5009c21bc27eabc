//! Configuration types for telegram-client.

use std::fmt;
use std::time::Duration;

/// Default Bot API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Configuration for connecting to the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Base URL of the Bot API (e.g., "https://api.telegram.org").
    pub base_url: String,
    /// Bot token issued by @BotFather.
    pub token: String,
    /// Timeout for a single API request. Long polls add their own wait on top.
    pub request_timeout: Duration,
}

impl TelegramConfig {
    /// Create a new configuration for the public Bot API.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Use a different API server (local Bot API server, test double).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Get the URL for a Bot API method.
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
