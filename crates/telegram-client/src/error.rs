//! Error types for telegram-client.

use thiserror::Error;

/// Errors that can occur when talking to the Telegram Bot API.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API answered with `ok: false`.
    #[error("API error {code}: {description}")]
    Api { code: u16, description: String },

    /// Another consumer (usually a webhook) holds the update stream.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl TelegramError {
    /// Whether the recipient blocked the bot or the chat is gone.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, TelegramError::Api { code: 403, .. })
    }

    /// Whether this error is a getUpdates conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, TelegramError::Conflict(_))
    }
}
