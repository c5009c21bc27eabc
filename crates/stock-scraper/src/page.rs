//! HTTP fetching of the category page.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA};
use thiserror::Error;
use tracing::{error, info};

use crate::extract::extract_counts;
use crate::{StockCounts, StockSource};

/// Default timeout for fetching the page.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/141.0.0.0 Safari/537.36";

/// Errors raised while fetching the page.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
}

/// Scrapes item counts from the category listing page.
#[derive(Debug, Clone)]
pub struct PageScraper {
    http: reqwest::Client,
    url: String,
}

impl PageScraper {
    /// Build a scraper for `url` with a bounded request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ScrapeError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(browser_headers())
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Download the page body.
    pub async fn fetch_page(&self) -> Result<String, ScrapeError> {
        let response = self.http.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status(status));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl StockSource for PageScraper {
    async fn fetch_counts(&self) -> StockCounts {
        match self.fetch_page().await {
            Ok(body) => {
                let counts = extract_counts(&body);
                info!(
                    men = counts.men,
                    women = counts.women,
                    total = counts.total(),
                    "Extracted stock counts"
                );
                counts
            }
            Err(e) => {
                error!(url = %self.url, error = %e, "Failed to fetch stock page");
                StockCounts::default()
            }
        }
    }

    fn source_url(&self) -> &str {
        &self.url
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));
    headers.insert("upgrade-insecure-requests", HeaderValue::from_static("1"));
    headers
}
