//! Update, message and chat types returned by the Bot API.

use serde::{Deserialize, Serialize};

/// Envelope wrapping every Bot API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded.
    pub ok: bool,
    /// Method result on success.
    pub result: Option<T>,
    /// Human-readable error on failure.
    #[serde(default)]
    pub description: Option<String>,
    /// Error code on failure (mirrors the HTTP status).
    #[serde(default)]
    pub error_code: Option<u16>,
}

/// An incoming update from `getUpdates`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Update {
    /// Monotonically increasing update identifier.
    pub update_id: i64,

    /// New incoming message, if this update carries one.
    #[serde(default)]
    pub message: Option<Message>,
}

/// A chat message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    /// Message identifier inside the chat.
    pub message_id: i64,

    /// Sender; absent for channel posts.
    #[serde(default)]
    pub from: Option<User>,

    /// Chat the message belongs to.
    pub chat: Chat,

    /// Unix timestamp.
    #[serde(default)]
    pub date: i64,

    /// Text content.
    #[serde(default)]
    pub text: Option<String>,
}

/// A Telegram user or bot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl User {
    /// First name followed by last name, if any.
    pub fn full_name(&self) -> String {
        join_name(Some(&self.first_name), self.last_name.as_deref())
    }
}

/// A chat, as returned inside messages or by `getChat`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    /// "private", "group", "supergroup" or "channel".
    #[serde(rename = "type", default)]
    pub chat_type: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Chat {
    /// Best display name: personal name for private chats, title otherwise.
    pub fn display_name(&self) -> String {
        let name = join_name(self.first_name.as_deref(), self.last_name.as_deref());
        if name.is_empty() {
            self.title.clone().unwrap_or_default()
        } else {
            name
        }
    }
}

/// Result of `getWebhookInfo`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookInfo {
    /// Webhook URL, empty when polling mode is active.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub pending_update_count: i64,
}

fn join_name(first: Option<&str>, last: Option<&str>) -> String {
    [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
