//! Stock change detection with per-level notification dedup.

use std::time::Duration;

use database::{stock, stock_notification, Category, Database, DatabaseError, NewObservation};
use stock_scraper::StockCounts;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Detection thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Men's increase that triggers an alert.
    pub men_threshold: i64,
    /// Women's increase that triggers an alert.
    pub women_threshold: i64,
    /// Men's count must be at least this for a men's alert.
    pub min_stock_floor: i64,
    /// An alert for the same level is suppressed inside this window.
    pub dedup_window: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            men_threshold: 2,
            women_threshold: 50,
            min_stock_floor: 1,
            dedup_window: Duration::from_secs(3600),
        }
    }
}

/// Result of evaluating one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing worth notifying.
    NoChange,
    /// Manual check; report counts to the caller only.
    StatusReport,
    /// Men's count rose by the contained delta.
    MenThresholdCrossed(i64),
    /// Women's count rose by the contained delta.
    WomenThresholdCrossed(i64),
    /// The page yielded no counts; nothing was persisted.
    ExtractionFailed,
}

impl Outcome {
    /// Category and delta when this outcome should be broadcast.
    pub fn crossed(&self) -> Option<(Category, i64)> {
        match *self {
            Outcome::MenThresholdCrossed(delta) => Some((Category::Men, delta)),
            Outcome::WomenThresholdCrossed(delta) => Some((Category::Women, delta)),
            _ => None,
        }
    }
}

/// Outcome together with the counts it was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub outcome: Outcome,
    pub current: StockCounts,
    pub previous: StockCounts,
    /// Dedup record written for a crossing.
    pub notification_id: Option<i64>,
}

impl Evaluation {
    pub fn men_change(&self) -> i64 {
        self.current.men - self.previous.men
    }

    pub fn women_change(&self) -> i64 {
        self.current.women - self.previous.women
    }

    /// Current and previous count for a category.
    pub fn counts_for(&self, category: Category) -> (i64, i64) {
        match category {
            Category::Men => (self.current.men, self.previous.men),
            Category::Women => (self.current.women, self.previous.women),
        }
    }
}

/// Decides whether an observation is a new, not-yet-notified event and
/// persists that decision.
pub struct ChangeDetector {
    db: Database,
    config: DetectorConfig,
    // Serializes read-baseline / decide / write across scheduled and manual checks.
    lock: Mutex<()>,
}

impl ChangeDetector {
    pub fn new(db: Database, config: DetectorConfig) -> Self {
        Self {
            db,
            config,
            lock: Mutex::new(()),
        }
    }

    /// Evaluate an observation against the latest persisted one.
    ///
    /// Manual checks are persisted but never trigger an alert. For a crossing
    /// the dedup record is written before this returns.
    pub async fn evaluate(
        &self,
        counts: StockCounts,
        manual: bool,
    ) -> Result<Evaluation, DatabaseError> {
        if counts.total() == 0 && counts.men == 0 {
            return Ok(Evaluation {
                outcome: Outcome::ExtractionFailed,
                current: counts,
                previous: StockCounts::default(),
                notification_id: None,
            });
        }

        let _guard = self.lock.lock().await;
        let pool = self.db.pool();

        let previous = stock::latest_observation(pool)
            .await?
            .map(|obs| StockCounts::new(obs.men_count, obs.women_count))
            .unwrap_or_default();
        let men_change = counts.men - previous.men;
        let women_change = counts.women - previous.women;

        debug!(
            men = counts.men,
            women = counts.women,
            men_change,
            women_change,
            manual,
            "Evaluating observation"
        );

        let outcome = if manual {
            Outcome::StatusReport
        } else if men_change >= self.config.men_threshold
            && counts.men >= self.config.min_stock_floor
            && !self.recently_notified(Category::Men, counts.men).await?
        {
            Outcome::MenThresholdCrossed(men_change)
        } else if women_change >= self.config.women_threshold
            && !self.recently_notified(Category::Women, counts.women).await?
        {
            Outcome::WomenThresholdCrossed(women_change)
        } else {
            Outcome::NoChange
        };

        let stock_change = match outcome {
            Outcome::WomenThresholdCrossed(delta) => delta,
            _ => men_change,
        };

        stock::append_observation(
            pool,
            &NewObservation {
                total_stock: counts.total(),
                men_count: counts.men,
                women_count: counts.women,
                stock_change,
                notified: outcome.crossed().is_some(),
            },
        )
        .await?;

        let notification_id = match outcome.crossed() {
            Some((category, delta)) => {
                let level = match category {
                    Category::Men => counts.men,
                    Category::Women => counts.women,
                };
                let id = stock_notification::record_notification(pool, category, level).await?;
                info!(category = %category, level, delta, "Stock threshold crossed");
                Some(id)
            }
            None => None,
        };

        Ok(Evaluation {
            outcome,
            current: counts,
            previous,
            notification_id,
        })
    }

    async fn recently_notified(&self, category: Category, level: i64) -> Result<bool, DatabaseError> {
        let seen = stock_notification::has_recent_notification(
            self.db.pool(),
            category,
            level,
            self.config.dedup_window,
        )
        .await?;
        if seen {
            debug!(category = %category, level, "Alert for this level already sent");
        }
        Ok(seen)
    }
}
