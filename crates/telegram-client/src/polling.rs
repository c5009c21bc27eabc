//! `getUpdates` polling with a persistent cursor and error backoff.

use std::time::Duration;

use tracing::{debug, error, warn};

use crate::client::TelegramClient;
use crate::error::TelegramError;
use crate::types::Update;

/// Configuration for update polling.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Long-poll wait passed to `getUpdates`, in seconds. 0 = short polling.
    pub long_poll_timeout: u32,
    /// Pause after an empty batch.
    pub idle_delay: Duration,
    /// Pause after a transient error.
    pub error_delay: Duration,
    /// Pause after a webhook conflict.
    pub conflict_delay: Duration,
    /// Consecutive errors before taking a long pause.
    pub max_consecutive_errors: u32,
    /// Long pause after too many consecutive errors.
    pub cooldown: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            long_poll_timeout: 0,
            idle_delay: Duration::from_millis(500),
            error_delay: Duration::from_secs(2),
            conflict_delay: Duration::from_secs(30),
            max_consecutive_errors: 10,
            cooldown: Duration::from_secs(30),
        }
    }
}

/// Polls `getUpdates`, tracking the update cursor so each update is
/// delivered exactly once.
pub struct UpdatePoller {
    client: TelegramClient,
    config: PollConfig,
    last_update_id: i64,
    consecutive_errors: u32,
}

impl UpdatePoller {
    /// Create a poller starting from the beginning of the pending queue.
    pub fn new(client: TelegramClient, config: PollConfig) -> Self {
        Self {
            client,
            config,
            last_update_id: 0,
            consecutive_errors: 0,
        }
    }

    /// Offset for the next `getUpdates` call.
    pub fn offset(&self) -> i64 {
        self.last_update_id + 1
    }

    /// Fetch the next batch of updates and advance the cursor.
    ///
    /// Sleeps for `idle_delay` when the batch is empty. Errors are returned
    /// to the caller, who should sleep for [`UpdatePoller::delay_after_error`].
    pub async fn next_batch(&mut self) -> Result<Vec<Update>, TelegramError> {
        let updates = self
            .client
            .get_updates(self.offset(), self.config.long_poll_timeout)
            .await?;

        self.consecutive_errors = 0;
        self.advance(&updates);

        if updates.is_empty() {
            tokio::time::sleep(self.config.idle_delay).await;
        } else {
            debug!("Received {} updates (next offset {})", updates.len(), self.offset());
        }

        Ok(updates)
    }

    /// Move the cursor past every update in the batch.
    pub fn advance(&mut self, updates: &[Update]) {
        if let Some(max_id) = updates.iter().map(|u| u.update_id).max() {
            self.last_update_id = self.last_update_id.max(max_id);
        }
    }

    /// Register a failed poll and return how long to wait before the next one.
    pub fn delay_after_error(&mut self, err: &TelegramError) -> Duration {
        if err.is_conflict() {
            error!("Update conflict: another consumer is using this bot token ({})", err);
            return self.config.conflict_delay;
        }

        self.consecutive_errors += 1;
        warn!(
            "Polling error ({}/{}): {}",
            self.consecutive_errors, self.config.max_consecutive_errors, err
        );

        if self.consecutive_errors >= self.config.max_consecutive_errors {
            warn!("Too many polling errors, cooling down");
            self.consecutive_errors = 0;
            self.config.cooldown
        } else {
            self.config.error_delay
        }
    }

    /// Get the underlying client.
    pub fn client(&self) -> &TelegramClient {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TelegramConfig;

    fn poller() -> UpdatePoller {
        let client = TelegramClient::new(TelegramConfig::new("123:abc")).unwrap();
        UpdatePoller::new(client, PollConfig::default())
    }

    fn update(id: i64) -> Update {
        Update {
            update_id: id,
            message: None,
        }
    }

    #[test]
    fn test_cursor_advances_past_batch() {
        let mut poller = poller();
        assert_eq!(poller.offset(), 1);

        poller.advance(&[update(10), update(12), update(11)]);
        assert_eq!(poller.offset(), 13);

        // Empty or stale batches never move the cursor backwards.
        poller.advance(&[]);
        poller.advance(&[update(5)]);
        assert_eq!(poller.offset(), 13);
    }

    #[test]
    fn test_conflict_backoff() {
        let mut poller = poller();
        let err = TelegramError::Conflict("webhook active".to_string());
        assert_eq!(poller.delay_after_error(&err), Duration::from_secs(30));
    }

    #[test]
    fn test_cooldown_after_repeated_errors() {
        let mut poller = poller();
        let err = TelegramError::Api {
            code: 502,
            description: "Bad Gateway".to_string(),
        };

        for _ in 0..9 {
            assert_eq!(poller.delay_after_error(&err), Duration::from_secs(2));
        }
        assert_eq!(poller.delay_after_error(&err), Duration::from_secs(30));
        // Counter resets after the cooldown.
        assert_eq!(poller.delay_after_error(&err), Duration::from_secs(2));
    }
}
