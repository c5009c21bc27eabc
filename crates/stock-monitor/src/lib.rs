//! Stock change monitor.
//!
//! Wires a [`StockSource`](stock_scraper::StockSource) to the change
//! detector and broadcasts alerts to registered recipients:
//!
//! - [`detector`] decides whether an observation is a new event and records it
//! - [`dispatcher`] fans a message out to every active recipient
//! - [`scheduler`] runs the check on a fixed interval
//! - [`commands`] and [`listener`] serve the bot command interface
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use broadcaster::Broadcaster;
//! use database::Database;
//! use stock_monitor::{ChangeDetector, DetectorConfig, Dispatcher, Scheduler, StockMonitor};
//! use stock_scraper::{PageScraper, DEFAULT_FETCH_TIMEOUT};
//! use telegram_client::TelegramConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite:stock_monitor.db?mode=rwc").await?;
//! db.migrate().await?;
//!
//! let source = PageScraper::new("https://shop.example/c/listing", DEFAULT_FETCH_TIMEOUT)?;
//! let sender = Broadcaster::connect(TelegramConfig::new("123456:ABC-DEF")).await?;
//! let monitor = Arc::new(StockMonitor::new(
//!     source,
//!     ChangeDetector::new(db.clone(), DetectorConfig::default()),
//!     Dispatcher::new(db.clone(), sender),
//!     db,
//!     "1366899854",
//! ));
//!
//! let scheduler = Scheduler::new(monitor, Duration::from_secs(2));
//! scheduler.start();
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod config;
pub mod detector;
pub mod dispatcher;
pub mod error;
pub mod listener;
pub mod messages;
pub mod monitor;
pub mod scheduler;

#[cfg(test)]
mod test_support;

pub use commands::{Command, CommandHandler, InboundCommand};
pub use config::{Config, ConfigError};
pub use detector::{ChangeDetector, DetectorConfig, Evaluation, Outcome};
pub use dispatcher::{BroadcastReport, Dispatcher};
pub use error::MonitorError;
pub use listener::run_command_loop;
pub use monitor::StockMonitor;
pub use scheduler::{Job, Scheduler, SchedulerState};
