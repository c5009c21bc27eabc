//! Fan-out of messages to registered recipients.

use std::time::Duration;

use broadcaster::MessageSender;
use database::{recipient, Database, DatabaseError};
use telegram_client::ReplyKeyboardMarkup;
use tracing::{info, warn};

/// Default pause between two broadcast sends.
pub const DEFAULT_SEND_DELAY: Duration = Duration::from_millis(100);

/// Result of a broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Number of recipients the message reached.
    pub sent: usize,
    /// Number of active recipients at the start of the broadcast.
    pub total: usize,
    /// `user_id: error` for each failed delivery.
    pub failed: Vec<String>,
}

/// Delivers messages to every active recipient, one at a time.
pub struct Dispatcher<M: MessageSender> {
    db: Database,
    sender: M,
    delay: Duration,
}

impl<M: MessageSender> Dispatcher<M> {
    pub fn new(db: Database, sender: M) -> Self {
        Self {
            db,
            sender,
            delay: DEFAULT_SEND_DELAY,
        }
    }

    /// Set the pause between sends.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn sender(&self) -> &M {
        &self.sender
    }

    /// Send `text` to all active recipients.
    ///
    /// Failed deliveries are logged and skipped. Recipients that blocked the
    /// bot are deactivated.
    pub async fn broadcast(&self, text: &str) -> Result<BroadcastReport, DatabaseError> {
        let pool = self.db.pool();
        let recipients = recipient::list_active_recipients(pool).await?;
        let total = recipients.len();

        info!(recipient_count = total, "Sending broadcast");

        let mut sent = 0;
        let mut failed = Vec::new();

        for (i, user) in recipients.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match self.sender.send_message(&user.chat_id, text).await {
                Ok(()) => {
                    sent += 1;
                    info!(recipient = %user.user_id, "Broadcast sent");
                }
                Err(err) => {
                    warn!(recipient = %user.user_id, error = %err, "Broadcast failed");
                    failed.push(format!("{}: {}", user.user_id, err));

                    if err.is_blocked() {
                        match recipient::deactivate_recipient(pool, &user.user_id).await {
                            Ok(()) => info!(recipient = %user.user_id, "Deactivated blocked recipient"),
                            Err(e) => {
                                warn!(recipient = %user.user_id, error = %e, "Failed to deactivate recipient")
                            }
                        }
                    }
                }
            }
        }

        info!(sent, failed = failed.len(), "Broadcast complete");

        Ok(BroadcastReport { sent, total, failed })
    }

    /// Send a single message.
    pub async fn send_to(&self, chat_id: &str, text: &str) -> Result<(), broadcaster::Error> {
        self.sender.send_message(chat_id, text).await
    }

    /// Send a single message with a reply keyboard.
    pub async fn send_with_keyboard(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: &ReplyKeyboardMarkup,
    ) -> Result<(), broadcaster::Error> {
        self.sender.send_with_keyboard(chat_id, text, keyboard).await
    }
}
