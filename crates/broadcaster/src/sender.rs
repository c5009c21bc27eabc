//! Delivery traits and simple implementations.

use async_trait::async_trait;
use telegram_client::ReplyKeyboardMarkup;

use crate::Error;

/// Trait for delivering messages to a chat.
///
/// Abstracted to support different transports (Telegram, tests, etc.)
/// Texts are HTML formatted.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send a message.
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), Error>;

    /// Send a message together with a reply keyboard.
    ///
    /// Default implementation ignores the keyboard and calls `send_message`.
    async fn send_with_keyboard(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: &ReplyKeyboardMarkup,
    ) -> Result<(), Error> {
        let _ = keyboard;
        self.send_message(chat_id, text).await
    }
}

/// Public profile of a chat user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    /// First and last name.
    pub display_name: String,
    /// @username without the `@`, possibly empty.
    pub username: String,
}

/// Trait for resolving a user ID to a profile.
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    async fn fetch_profile(&self, user_id: &str) -> Result<Profile, Error>;
}
