//! Delivery utilities for the stock monitor.
//!
//! This crate provides a high-level interface for sending Telegram messages
//! and looking up sender profiles, plus the [`MessageSender`] and
//! [`ProfileLookup`] traits the monitor is written against.
//!
//! # Example
//!
//! ```no_run
//! use broadcaster::{Broadcaster, MessageSender};
//! use telegram_client::TelegramConfig;
//!
//! # async fn example() -> Result<(), broadcaster::Error> {
//! let config = TelegramConfig::new("123456:ABC-DEF");
//! let broadcaster = Broadcaster::connect(config).await?;
//!
//! // Send an HTML message
//! broadcaster.send_message("1366899854", "<b>Hello!</b>").await?;
//! # Ok(())
//! # }
//! ```

mod sender;

pub use sender::{MessageSender, Profile, ProfileLookup};

use async_trait::async_trait;
use telegram_client::{
    ParseMode, ReplyKeyboardMarkup, SendMessageParams, TelegramClient, TelegramConfig,
    TelegramError,
};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during delivery operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Bot API communication error.
    #[error("Telegram error: {0}")]
    Telegram(#[from] TelegramError),

    /// Delivery failed for a reason outside the Bot API (test doubles, etc.).
    #[error("Send failed: {0}")]
    SendFailed(String),
}

impl Error {
    /// Whether the recipient blocked the bot.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Error::Telegram(e) if e.is_forbidden())
    }
}

/// A broadcaster for sending Telegram messages.
#[derive(Clone)]
pub struct Broadcaster {
    client: TelegramClient,
}

impl Broadcaster {
    /// Connect to the Bot API and create a broadcaster.
    pub async fn connect(config: TelegramConfig) -> Result<Self, Error> {
        let client = TelegramClient::connect(config).await?;
        info!("Broadcaster connected to Bot API");
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn from_client(client: TelegramClient) -> Self {
        Self { client }
    }

    /// Get the underlying TelegramClient.
    pub fn client(&self) -> &TelegramClient {
        &self.client
    }
}

#[async_trait]
impl MessageSender for Broadcaster {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), Error> {
        debug!(chat_id = %chat_id, "Sending message");
        let params = SendMessageParams::text(chat_id, text).with_parse_mode(ParseMode::Html);
        self.client.send(params).await?;
        Ok(())
    }

    async fn send_with_keyboard(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: &ReplyKeyboardMarkup,
    ) -> Result<(), Error> {
        debug!(chat_id = %chat_id, "Sending message with keyboard");
        let params = SendMessageParams::text(chat_id, text)
            .with_parse_mode(ParseMode::Html)
            .with_keyboard(keyboard.clone());
        self.client.send(params).await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileLookup for Broadcaster {
    async fn fetch_profile(&self, user_id: &str) -> Result<Profile, Error> {
        let chat = self.client.get_chat(user_id).await?;
        Ok(Profile {
            display_name: chat.display_name(),
            username: chat.username.unwrap_or_default(),
        })
    }
}

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
