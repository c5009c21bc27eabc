//! Stock count extraction for the monitored category page.
//!
//! The core only sees [`StockSource::fetch_counts`], which never fails: any
//! network or parse problem yields [`StockCounts::default`] (all zeros).

mod extract;
mod page;

pub use extract::{extract_counts, Gender};
pub use page::{PageScraper, ScrapeError, DEFAULT_FETCH_TIMEOUT};

use async_trait::async_trait;

/// Item counts for the two tracked filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StockCounts {
    pub men: i64,
    pub women: i64,
}

impl StockCounts {
    pub fn new(men: i64, women: i64) -> Self {
        Self { men, women }
    }

    /// Men + women.
    pub fn total(&self) -> i64 {
        self.men + self.women
    }
}

/// Something that can report current stock counts.
#[async_trait]
pub trait StockSource: Send + Sync {
    /// Fetch the current counts, failing closed to `(0, 0)`.
    async fn fetch_counts(&self) -> StockCounts;

    /// URL shown to users in alerts and status messages.
    fn source_url(&self) -> &str;
}
