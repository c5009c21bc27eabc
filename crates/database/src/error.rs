//! Store error types.

use thiserror::Error;

/// Errors raised by the stock, dedup and recipient stores.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Query or connection failure.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Schema migration failed at startup.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// No row with this key (recipient user ID, notification ID).
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
