//! Database models.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One stock check, as persisted in `stock_history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StockObservation {
    /// Auto-incrementing ID. Monotonic with insertion order.
    pub id: i64,
    /// Creation timestamp (`YYYY-MM-DD HH:MM:SS`, UTC).
    pub created_at: String,
    /// Men + women item count.
    pub total_stock: i64,
    /// Items under the men's filter.
    pub men_count: i64,
    /// Items under the women's filter.
    pub women_count: i64,
    /// Delta from the previous observation for the category that was evaluated.
    pub stock_change: i64,
    /// Whether this check triggered an alert broadcast.
    pub notified: bool,
}

/// A stock check that has not been persisted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NewObservation {
    pub total_stock: i64,
    pub men_count: i64,
    pub women_count: i64,
    pub stock_change: i64,
    pub notified: bool,
}

/// Stock category tracked by the dedup log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Men,
    Women,
}

impl Category {
    /// Value stored in `stock_notifications.notification_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Men => "men_stock",
            Category::Women => "women_stock",
        }
    }

    /// Parse a stored notification type.
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "men_stock" => Some(Category::Men),
            "women_stock" => Some(Category::Women),
            _ => None,
        }
    }

    /// Human-readable label used in alert texts.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Men => "Men's",
            Category::Women => "Women's",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dedup log entry in `stock_notifications`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct NotificationRecord {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Exact stock level that was announced.
    pub stock_level: i64,
    /// Category as stored (see [`Category::as_str`]).
    pub notification_type: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Number of recipients the broadcast reached.
    pub notified_count: i64,
}

/// A registered chat user, identified by their Telegram user ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Recipient {
    /// Telegram user ID (unique).
    pub user_id: String,
    /// First and last name as reported by Telegram.
    pub display_name: String,
    /// Telegram @username without the `@`, possibly empty.
    pub username: String,
    /// Chat to deliver broadcasts to.
    pub chat_id: String,
    /// Inactive recipients are skipped by broadcasts.
    pub is_active: bool,
    /// First interaction timestamp.
    pub joined_at: String,
    /// Most recent interaction timestamp.
    pub last_seen_at: String,
}

/// Fields written on every interaction with a recipient.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecipientUpsert {
    pub user_id: String,
    pub display_name: String,
    pub username: String,
    pub chat_id: String,
}
