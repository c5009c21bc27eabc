//! Shared test doubles.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use broadcaster::{Error, MessageSender, Profile, ProfileLookup};
use database::{recipient, Database, RecipientUpsert};
use stock_scraper::{StockCounts, StockSource};
use telegram_client::{ReplyKeyboardMarkup, TelegramError};

pub async fn test_db() -> Database {
    let db = Database::connect_with_pool_size("sqlite::memory:", 1)
        .await
        .unwrap();
    db.migrate().await.unwrap();
    db
}

pub async fn add_recipient(db: &Database, user_id: &str, name: &str) {
    recipient::upsert_recipient(
        db.pool(),
        &RecipientUpsert {
            user_id: user_id.to_string(),
            display_name: name.to_string(),
            username: String::new(),
            chat_id: user_id.to_string(),
        },
    )
    .await
    .unwrap();
}

/// A sent message as seen by [`RecordingSender`].
#[derive(Debug, Clone)]
pub struct Sent {
    pub chat_id: String,
    pub text: String,
    pub keyboard: Option<ReplyKeyboardMarkup>,
}

/// Records every message; fails for selected chats.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<Sent>>,
    failing: HashSet<String>,
    blocked: HashSet<String>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliveries to `chat_id` fail with a generic error.
    pub fn failing_for(mut self, chat_id: &str) -> Self {
        self.failing.insert(chat_id.to_string());
        self
    }

    /// Deliveries to `chat_id` fail as if the user blocked the bot.
    pub fn blocked_by(mut self, chat_id: &str) -> Self {
        self.blocked.insert(chat_id.to_string());
        self
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat_id: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|m| m.chat_id == chat_id)
            .map(|m| m.text)
            .collect()
    }

    fn record(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<&ReplyKeyboardMarkup>,
    ) -> Result<(), Error> {
        if self.blocked.contains(chat_id) {
            return Err(Error::Telegram(TelegramError::Api {
                code: 403,
                description: "Forbidden: bot was blocked by the user".to_string(),
            }));
        }
        if self.failing.contains(chat_id) {
            return Err(Error::SendFailed(format!("no route to {}", chat_id)));
        }
        self.sent.lock().unwrap().push(Sent {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), Error> {
        self.record(chat_id, text, None)
    }

    async fn send_with_keyboard(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: &ReplyKeyboardMarkup,
    ) -> Result<(), Error> {
        self.record(chat_id, text, Some(keyboard))
    }
}

/// Source that returns whatever counts were last set.
pub struct FixedSource {
    counts: Mutex<StockCounts>,
}

impl FixedSource {
    pub fn new(men: i64, women: i64) -> Self {
        Self {
            counts: Mutex::new(StockCounts::new(men, women)),
        }
    }

    pub fn set(&self, men: i64, women: i64) {
        *self.counts.lock().unwrap() = StockCounts::new(men, women);
    }
}

#[async_trait]
impl StockSource for FixedSource {
    async fn fetch_counts(&self) -> StockCounts {
        *self.counts.lock().unwrap()
    }

    fn source_url(&self) -> &str {
        "https://shop.test/c/listing"
    }
}

/// Profile lookup backed by a map; unknown users fail.
#[derive(Default)]
pub struct StaticProfiles {
    profiles: HashMap<String, Profile>,
}

impl StaticProfiles {
    pub fn with(mut self, user_id: &str, display_name: &str, username: &str) -> Self {
        self.profiles.insert(
            user_id.to_string(),
            Profile {
                display_name: display_name.to_string(),
                username: username.to_string(),
            },
        );
        self
    }
}

#[async_trait]
impl ProfileLookup for StaticProfiles {
    async fn fetch_profile(&self, user_id: &str) -> Result<Profile, Error> {
        self.profiles
            .get(user_id)
            .cloned()
            .ok_or_else(|| Error::SendFailed(format!("chat not found: {}", user_id)))
    }
}
