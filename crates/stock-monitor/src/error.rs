//! Error types for monitor operations.

use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur while checking stock or handling commands.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Reading or writing persisted state failed.
    #[error("store error: {0}")]
    Database(#[from] DatabaseError),

    /// Delivering a message failed.
    #[error("send failed: {0}")]
    Send(#[from] broadcaster::Error),

    /// The page could not be scraped (counts came back as zero).
    #[error("could not retrieve stock count")]
    ExtractionFailed,
}
