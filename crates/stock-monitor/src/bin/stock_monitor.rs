use std::sync::Arc;

use broadcaster::Broadcaster;
use database::Database;
use stock_monitor::{
    run_command_loop, ChangeDetector, CommandHandler, Config, Dispatcher, Scheduler,
    StockMonitor,
};
use stock_scraper::{PageScraper, DEFAULT_FETCH_TIMEOUT};
use telegram_client::{PollConfig, TelegramClient, TelegramConfig, UpdatePoller};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    info!(
        source = %config.source_url,
        interval_secs = config.poll_interval.as_secs(),
        admins = config.admin_user_ids.len(),
        "Starting stock monitor"
    );

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let telegram_config = TelegramConfig::new(&config.telegram_bot_token)
        .with_base_url(&config.telegram_api_url);
    let client = TelegramClient::connect(telegram_config).await?;
    if let Err(e) = client.ensure_polling_mode().await {
        warn!("Polling mode not confirmed: {}", e);
    }
    let broadcaster = Broadcaster::from_client(client.clone());

    let source = PageScraper::new(&config.source_url, DEFAULT_FETCH_TIMEOUT)?;
    let detector = ChangeDetector::new(db.clone(), config.detector);
    let dispatcher =
        Dispatcher::new(db.clone(), broadcaster.clone()).with_delay(config.broadcast_delay);
    let monitor = Arc::new(StockMonitor::new(
        source,
        detector,
        dispatcher,
        db.clone(),
        &config.operator_chat_id,
    ));

    if config.announce_on_startup {
        match monitor.announce().await {
            Ok(report) => info!(sent = report.sent, total = report.total, "Startup announcement sent"),
            Err(e) => warn!("Startup announcement failed: {}", e),
        }
    }

    // The first tick runs immediately.
    let scheduler = Scheduler::new(monitor.clone(), config.poll_interval);
    scheduler.start();

    let handler = Arc::new(CommandHandler::new(
        monitor,
        scheduler.clone(),
        broadcaster,
        config.admin_user_ids.clone(),
    ));
    let poller = UpdatePoller::new(client, PollConfig::default());

    run_command_loop(handler, poller, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await;

    scheduler.stop();
    db.close().await;
    info!("Stock monitor stopped");

    Ok(())
}
