//! Types for sending messages via the Bot API.

use serde::{Deserialize, Serialize};

/// Text formatting mode for outgoing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    #[serde(rename = "HTML")]
    Html,
    #[serde(rename = "MarkdownV2")]
    MarkdownV2,
}

/// Parameters for `sendMessage`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SendMessageParams {
    /// Target chat ID (or `@channelusername`).
    pub chat_id: String,

    /// The message text.
    pub text: String,

    /// Formatting mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,

    /// Custom reply keyboard.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyKeyboardMarkup>,

    /// Disable link previews.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disable_web_page_preview: bool,
}

impl SendMessageParams {
    /// Create new params for a plain text message.
    pub fn text(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    /// Set the formatting mode.
    pub fn with_parse_mode(mut self, parse_mode: ParseMode) -> Self {
        self.parse_mode = Some(parse_mode);
        self
    }

    /// Attach a reply keyboard.
    pub fn with_keyboard(mut self, keyboard: ReplyKeyboardMarkup) -> Self {
        self.reply_markup = Some(keyboard);
        self
    }
}

/// A persistent keyboard shown under the input field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplyKeyboardMarkup {
    /// Rows of buttons.
    pub keyboard: Vec<Vec<KeyboardButton>>,
    /// Let clients shrink the keyboard to fit its buttons.
    pub resize_keyboard: bool,
    /// Hide the keyboard after one use.
    pub one_time_keyboard: bool,
}

impl ReplyKeyboardMarkup {
    /// Build a keyboard from rows of button labels.
    pub fn from_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keyboard: rows
                .into_iter()
                .map(|row| row.into_iter().map(KeyboardButton::new).collect())
                .collect(),
            resize_keyboard: true,
            one_time_keyboard: false,
        }
    }
}

/// A single keyboard button that sends its label as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

impl KeyboardButton {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Parameters for `getUpdates`.
#[derive(Debug, Clone, Serialize)]
pub struct GetUpdatesParams {
    /// First update to return (last seen `update_id` + 1).
    pub offset: i64,
    /// Long-poll wait in seconds; 0 for short polling.
    pub timeout: u32,
    /// Update types to receive.
    pub allowed_updates: Vec<String>,
}

/// Parameters for `getChat`.
#[derive(Debug, Clone, Serialize)]
pub struct GetChatParams {
    pub chat_id: String,
}

/// Parameters for `deleteWebhook`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeleteWebhookParams {
    /// Drop updates queued while the webhook was active.
    pub drop_pending_updates: bool,
}
