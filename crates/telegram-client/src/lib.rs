//! Telegram Bot API client library.
//!
//! This crate provides a Rust client for the Telegram Bot HTTP API. It supports:
//!
//! - Sending messages (optionally with a reply keyboard) to chats
//! - Receiving updates through `getUpdates` polling with a persistent cursor
//! - Health checking (`getMe`) and switching the bot into polling mode
//!
//! # Example
//!
//! ```no_run
//! use telegram_client::{PollConfig, SendMessageParams, TelegramClient, TelegramConfig, UpdatePoller};
//!
//! # async fn example() -> Result<(), telegram_client::TelegramError> {
//! let config = TelegramConfig::new("123456:ABC-DEF");
//! let client = TelegramClient::connect(config).await?;
//!
//! // Send a message
//! let sent = client.send(SendMessageParams::text("1366899854", "Hello!")).await?;
//! println!("Sent message {}", sent.message_id);
//!
//! // Poll for incoming updates
//! let mut poller = UpdatePoller::new(client.clone(), PollConfig::default());
//! loop {
//!     for update in poller.next_batch().await? {
//!         if let Some(text) = update.message.as_ref().and_then(|m| m.text.as_deref()) {
//!             println!("Update {}: {}", update.update_id, text);
//!         }
//!     }
//! }
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod polling;
pub mod types;

pub use client::TelegramClient;
pub use config::TelegramConfig;
pub use error::TelegramError;
pub use polling::{PollConfig, UpdatePoller};
pub use types::*;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
