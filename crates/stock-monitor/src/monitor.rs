//! Check cycle: fetch counts, evaluate, and broadcast alerts.

use async_trait::async_trait;
use broadcaster::MessageSender;
use database::{stock_notification, Database};
use stock_scraper::StockSource;
use tracing::{error, info, warn};

use crate::detector::{ChangeDetector, Evaluation, Outcome};
use crate::dispatcher::{BroadcastReport, Dispatcher};
use crate::error::MonitorError;
use crate::messages;
use crate::scheduler::Job;

/// Stock monitor shared by the scheduler and the command handler.
pub struct StockMonitor<S: StockSource, M: MessageSender> {
    source: S,
    detector: ChangeDetector,
    dispatcher: Dispatcher<M>,
    db: Database,
    operator_chat_id: String,
}

impl<S: StockSource, M: MessageSender> StockMonitor<S, M> {
    pub fn new(
        source: S,
        detector: ChangeDetector,
        dispatcher: Dispatcher<M>,
        db: Database,
        operator_chat_id: impl Into<String>,
    ) -> Self {
        Self {
            source,
            detector,
            dispatcher,
            db,
            operator_chat_id: operator_chat_id.into(),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn dispatcher(&self) -> &Dispatcher<M> {
        &self.dispatcher
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_url(&self) -> &str {
        self.source.source_url()
    }

    /// Run one scheduled check, broadcasting an alert if a threshold was crossed.
    pub async fn run_scheduled_check(&self) -> Result<Evaluation, MonitorError> {
        let counts = self.source.fetch_counts().await;
        let eval = self.detector.evaluate(counts, false).await?;

        match eval.outcome {
            Outcome::ExtractionFailed => return Err(MonitorError::ExtractionFailed),
            Outcome::NoChange => {
                info!(men = counts.men, women = counts.women, "No significant stock change");
            }
            _ => {}
        }

        if let Some((category, increase)) = eval.outcome.crossed() {
            let (current, previous) = eval.counts_for(category);
            let alert =
                messages::stock_alert(category, increase, current, previous, self.source_url());
            let report = self.dispatcher.broadcast(&alert).await?;

            if let Some(id) = eval.notification_id {
                if let Err(e) =
                    stock_notification::set_notified_count(self.db.pool(), id, report.sent as i64)
                        .await
                {
                    warn!(notification_id = id, error = %e, "Failed to store delivery count");
                }
            }

            let text = messages::operator_report(category, increase, &report);
            if let Err(e) = self.dispatcher.send_to(&self.operator_chat_id, &text).await {
                warn!(error = %e, "Failed to send operator report");
            }
        }

        Ok(eval)
    }

    /// Run a manual check. Never broadcasts.
    pub async fn run_manual_check(&self) -> Result<Evaluation, MonitorError> {
        let counts = self.source.fetch_counts().await;
        let eval = self.detector.evaluate(counts, true).await?;
        if eval.outcome == Outcome::ExtractionFailed {
            return Err(MonitorError::ExtractionFailed);
        }
        info!(men = counts.men, women = counts.women, "Manual stock check");
        Ok(eval)
    }

    /// Broadcast a test notification to every active recipient.
    pub async fn announce(&self) -> Result<BroadcastReport, MonitorError> {
        let text = messages::test_notification(self.source_url());
        Ok(self.dispatcher.broadcast(&text).await?)
    }

    /// Send a test notification to a single chat.
    pub async fn send_test_notification(&self, chat_id: &str) -> Result<(), MonitorError> {
        let text = messages::test_notification(self.source_url());
        self.dispatcher.send_to(chat_id, &text).await?;
        Ok(())
    }
}

#[async_trait]
impl<S, M> Job for StockMonitor<S, M>
where
    S: StockSource + 'static,
    M: MessageSender + 'static,
{
    async fn run(&self) {
        match self.run_scheduled_check().await {
            Ok(_) => {}
            Err(MonitorError::ExtractionFailed) => warn!("Could not retrieve stock count"),
            Err(e) => error!("Stock check failed: {}", e),
        }
    }
}
