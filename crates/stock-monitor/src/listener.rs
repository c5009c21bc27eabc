//! Command polling loop.

use std::future::Future;
use std::sync::Arc;

use broadcaster::{MessageSender, ProfileLookup};
use stock_scraper::StockSource;
use telegram_client::UpdatePoller;
use tracing::{debug, info};

use crate::commands::{CommandHandler, InboundCommand};

/// Poll for updates and dispatch commands until `shutdown` resolves.
///
/// Commands are handled one at a time in arrival order. Polling errors are
/// backed off according to the poller's configuration.
pub async fn run_command_loop<S, M, P, F>(
    handler: Arc<CommandHandler<S, M, P>>,
    mut poller: UpdatePoller,
    shutdown: F,
) where
    S: StockSource,
    M: MessageSender,
    P: ProfileLookup,
    F: Future<Output = ()>,
{
    info!("Listening for bot commands");
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Command loop shutting down");
                break;
            }
            batch = poller.next_batch() => match batch {
                Ok(updates) => {
                    for update in &updates {
                        match InboundCommand::from_update(update) {
                            Some(command) => handler.dispatch(&command).await,
                            None => debug!(update_id = update.update_id, "Skipping non-command update"),
                        }
                    }
                }
                Err(e) => {
                    let delay = poller.delay_after_error(&e);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
