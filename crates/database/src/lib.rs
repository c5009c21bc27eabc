//! SQLite persistence layer for the stock monitor.
//!
//! This crate provides async database operations for stock observations, the
//! notification dedup log, and registered recipients using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{Database, NewObservation, stock};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:stock_monitor.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Record a check
//!     let observation = NewObservation {
//!         total_stock: 42,
//!         men_count: 12,
//!         women_count: 30,
//!         ..Default::default()
//!     };
//!     stock::append_observation(db.pool(), &observation).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod models;
pub mod recipient;
pub mod stock;
pub mod stock_notification;

pub use error::{DatabaseError, Result};
pub use models::{
    Category, NewObservation, NotificationRecord, Recipient, RecipientUpsert, StockObservation,
};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Writes are low-volume and serialized by the caller; readers share the rest.
    const DEFAULT_POOL_SIZE: u32 = 4;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/stock_monitor.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .busy_timeout(std::time::Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(url, pool_size, "Connected to stock database");

        Ok(Self { pool })
    }

    /// Create or upgrade the `stock_history`, `bot_users` and
    /// `stock_notifications` tables. Safe to call on every start.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Stock database schema up to date");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool, waiting for in-flight queries.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Build a SQLite URL from a bare path, leaving `sqlite:` URLs untouched.
pub fn sqlite_url_from_path(path: &str) -> String {
    if path.starts_with("sqlite:") {
        path.to_string()
    } else {
        format!("sqlite:{}?mode=rwc", path)
    }
}
