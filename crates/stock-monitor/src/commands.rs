//! Bot command handling.

use std::collections::HashSet;
use std::sync::Arc;

use broadcaster::{MessageSender, Profile, ProfileLookup};
use database::{recipient, stock, RecipientUpsert};
use stock_scraper::StockSource;
use telegram_client::Update;
use tracing::{debug, error, info, warn};

use crate::error::MonitorError;
use crate::messages;
use crate::monitor::StockMonitor;
use crate::scheduler::Scheduler;

/// A text message addressed to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundCommand {
    pub text: String,
    pub chat_id: String,
    pub sender_id: String,
    /// Sender name as carried by the message itself.
    pub sender_name: String,
    pub sender_username: String,
}

impl InboundCommand {
    /// Extract a command from an update. Updates without text or sender are skipped.
    pub fn from_update(update: &Update) -> Option<Self> {
        let message = update.message.as_ref()?;
        let text = message.text.as_deref()?.trim();
        let from = message.from.as_ref()?;
        if text.is_empty() || from.is_bot {
            return None;
        }

        Some(Self {
            text: text.to_string(),
            chat_id: message.chat.id.to_string(),
            sender_id: from.id.to_string(),
            sender_name: from.full_name(),
            sender_username: from.username.clone().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    StartMonitor,
    StopMonitor,
    CheckNow,
    Status,
    Admin,
    Users,
    Unknown(String),
}

impl Command {
    /// Parse the first token of a message. `@botname` suffixes and arguments are ignored.
    pub fn parse(text: &str) -> Self {
        let token = text.split_whitespace().next().unwrap_or_default();
        let name = token.split('@').next().unwrap_or_default();
        match name {
            "/start" | "/help" => Command::Start,
            "/start_monitor" => Command::StartMonitor,
            "/stop_monitor" => Command::StopMonitor,
            "/check_now" => Command::CheckNow,
            "/status" => Command::Status,
            "/admin" => Command::Admin,
            "/users" => Command::Users,
            _ => Command::Unknown(token.to_string()),
        }
    }
}

/// Handles commands against a shared monitor and scheduler.
pub struct CommandHandler<S: StockSource, M: MessageSender, P: ProfileLookup> {
    monitor: Arc<StockMonitor<S, M>>,
    scheduler: Scheduler,
    profiles: P,
    admin_ids: HashSet<String>,
}

impl<S, M, P> CommandHandler<S, M, P>
where
    S: StockSource,
    M: MessageSender,
    P: ProfileLookup,
{
    pub fn new(
        monitor: Arc<StockMonitor<S, M>>,
        scheduler: Scheduler,
        profiles: P,
        admin_ids: HashSet<String>,
    ) -> Self {
        Self {
            monitor,
            scheduler,
            profiles,
            admin_ids,
        }
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admin_ids.contains(user_id)
    }

    /// Register the sender and run the command.
    ///
    /// Errors are logged and answered with a generic reply; they never
    /// propagate to the polling loop.
    pub async fn dispatch(&self, inbound: &InboundCommand) {
        info!(sender = %inbound.sender_id, command = %inbound.text, "Received command");

        self.register_sender(inbound).await;

        if let Err(e) = self.handle(inbound).await {
            error!(sender = %inbound.sender_id, error = %e, "Error handling command");
            if let Err(e) = self.reply(inbound, messages::TRY_AGAIN).await {
                warn!(chat_id = %inbound.chat_id, error = %e, "Failed to send error reply");
            }
        }
    }

    /// Upsert the sender into the recipient directory.
    async fn register_sender(&self, inbound: &InboundCommand) {
        let profile = match self.profiles.fetch_profile(&inbound.sender_id).await {
            Ok(profile) => profile,
            Err(e) => {
                debug!(sender = %inbound.sender_id, error = %e, "Profile lookup failed, using message names");
                Profile {
                    display_name: inbound.sender_name.clone(),
                    username: inbound.sender_username.clone(),
                }
            }
        };

        let upsert = RecipientUpsert {
            user_id: inbound.sender_id.clone(),
            display_name: profile.display_name,
            username: profile.username,
            chat_id: inbound.chat_id.clone(),
        };
        if let Err(e) = recipient::upsert_recipient(self.monitor.db().pool(), &upsert).await {
            warn!(sender = %inbound.sender_id, error = %e, "Failed to register recipient");
        }
    }

    async fn handle(&self, inbound: &InboundCommand) -> Result<(), MonitorError> {
        let is_admin = self.is_admin(&inbound.sender_id);
        let pool = self.monitor.db().pool();

        match Command::parse(&inbound.text) {
            Command::Start => {
                let count = recipient::count_active_recipients(pool).await?;
                self.reply_with_keyboard(inbound, &messages::welcome(is_admin, count), is_admin)
                    .await?;
            }
            Command::StartMonitor => {
                if !is_admin {
                    return self.reply(inbound, messages::DENIED_START).await;
                }
                if !self.scheduler.start() {
                    return self.reply(inbound, messages::ALREADY_RUNNING).await;
                }
                info!(sender = %inbound.sender_id, "Monitor started by admin");
                let count = recipient::count_active_recipients(pool).await?;
                self.reply_with_keyboard(inbound, &messages::started(count), is_admin)
                    .await?;
                self.monitor.send_test_notification(&inbound.chat_id).await?;
            }
            Command::StopMonitor => {
                if !is_admin {
                    return self.reply(inbound, messages::DENIED_STOP).await;
                }
                if !self.scheduler.stop() {
                    return self.reply(inbound, messages::NOT_RUNNING).await;
                }
                info!(sender = %inbound.sender_id, "Monitor stopped by admin");
                self.reply(inbound, messages::STOPPED).await?;
            }
            Command::CheckNow => {
                self.reply(inbound, messages::CHECKING).await?;
                match self.monitor.run_manual_check().await {
                    Ok(eval) => {
                        let text = messages::status_report(&eval, self.monitor.source_url());
                        self.reply(inbound, &text).await?;
                    }
                    Err(MonitorError::ExtractionFailed) => {
                        self.reply(inbound, messages::EXTRACTION_FAILED).await?;
                    }
                    Err(e) => return Err(e),
                }
            }
            Command::Status => {
                let count = recipient::count_active_recipients(pool).await?;
                let latest = stock::latest_observation(pool).await?;
                let text = messages::status(
                    self.scheduler.is_running(),
                    count,
                    self.scheduler.interval(),
                    latest.as_ref(),
                    self.monitor.source_url(),
                );
                self.reply(inbound, &text).await?;
            }
            Command::Admin => {
                if !is_admin {
                    return self.reply(inbound, messages::DENIED_ADMIN).await;
                }
                let count = recipient::count_active_recipients(pool).await?;
                let text = messages::admin_info(
                    self.scheduler.is_running(),
                    count,
                    self.admin_ids.len(),
                    &inbound.sender_id,
                );
                self.reply(inbound, &text).await?;
            }
            Command::Users => {
                if !is_admin {
                    return self.reply(inbound, messages::DENIED_ADMIN).await;
                }
                let recipients = recipient::list_active_recipients(pool).await?;
                self.reply(inbound, &messages::users(&recipients)).await?;
            }
            Command::Unknown(token) => {
                debug!(token = %token, "Unknown command");
                self.reply(inbound, messages::UNKNOWN_COMMAND).await?;
            }
        }

        Ok(())
    }

    async fn reply(&self, inbound: &InboundCommand, text: &str) -> Result<(), MonitorError> {
        self.monitor
            .dispatcher()
            .send_to(&inbound.chat_id, text)
            .await?;
        Ok(())
    }

    async fn reply_with_keyboard(
        &self,
        inbound: &InboundCommand,
        text: &str,
        is_admin: bool,
    ) -> Result<(), MonitorError> {
        self.monitor
            .dispatcher()
            .send_with_keyboard(&inbound.chat_id, text, &messages::keyboard(is_admin))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{ChangeDetector, DetectorConfig};
    use crate::dispatcher::Dispatcher;
    use crate::test_support::{test_db, FixedSource, RecordingSender, StaticProfiles};
    use std::time::Duration;
    use telegram_client::{Chat, Message, User};

    const ADMIN: &str = "100";
    const USER: &str = "200";

    type Handler = CommandHandler<FixedSource, RecordingSender, StaticProfiles>;

    async fn handler() -> Handler {
        let db = test_db().await;
        let detector = ChangeDetector::new(db.clone(), DetectorConfig::default());
        let dispatcher =
            Dispatcher::new(db.clone(), RecordingSender::new()).with_delay(Duration::ZERO);
        let monitor = Arc::new(StockMonitor::new(
            FixedSource::new(5, 10),
            detector,
            dispatcher,
            db,
            ADMIN,
        ));
        let scheduler = Scheduler::new(monitor.clone(), Duration::from_secs(3600));
        let profiles = StaticProfiles::default().with(ADMIN, "Asha Rao", "asha");
        let admins = HashSet::from([ADMIN.to_string()]);
        CommandHandler::new(monitor, scheduler, profiles, admins)
    }

    fn inbound(sender_id: &str, text: &str) -> InboundCommand {
        InboundCommand {
            text: text.to_string(),
            chat_id: sender_id.to_string(),
            sender_id: sender_id.to_string(),
            sender_name: format!("Sender {}", sender_id),
            sender_username: String::new(),
        }
    }

    fn replies(handler: &Handler, chat_id: &str) -> Vec<String> {
        handler.monitor.dispatcher().sender().sent_to(chat_id)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start"), Command::Start);
        assert_eq!(Command::parse("/help"), Command::Start);
        assert_eq!(Command::parse("/check_now@stock_watch_bot"), Command::CheckNow);
        assert_eq!(Command::parse("/status please"), Command::Status);
        assert_eq!(Command::parse("  /users  "), Command::Users);
        assert_eq!(Command::parse("hello"), Command::Unknown("hello".to_string()));
        assert_eq!(Command::parse(""), Command::Unknown(String::new()));
    }

    #[test]
    fn test_inbound_from_update() {
        let update = Update {
            update_id: 7,
            message: Some(Message {
                message_id: 1,
                from: Some(User {
                    id: 42,
                    first_name: "Asha".to_string(),
                    last_name: Some("Rao".to_string()),
                    username: Some("asha".to_string()),
                    ..Default::default()
                }),
                chat: Chat {
                    id: 42,
                    chat_type: "private".to_string(),
                    ..Default::default()
                },
                date: 0,
                text: Some(" /status ".to_string()),
            }),
        };

        let cmd = InboundCommand::from_update(&update).unwrap();
        assert_eq!(cmd.text, "/status");
        assert_eq!(cmd.sender_id, "42");
        assert_eq!(cmd.sender_name, "Asha Rao");
        assert_eq!(cmd.sender_username, "asha");

        let empty = Update {
            update_id: 8,
            message: None,
        };
        assert!(InboundCommand::from_update(&empty).is_none());
    }

    #[tokio::test]
    async fn test_sender_is_registered() {
        let handler = handler().await;
        handler.dispatch(&inbound(ADMIN, "/status")).await;
        handler.dispatch(&inbound(USER, "/status")).await;

        let pool = handler.monitor.db().pool();
        let admin = recipient::get_recipient(pool, ADMIN).await.unwrap();
        assert_eq!(admin.display_name, "Asha Rao");
        assert_eq!(admin.username, "asha");

        // Lookup fails for this user, so the message names are used.
        let user = recipient::get_recipient(pool, USER).await.unwrap();
        assert_eq!(user.display_name, "Sender 200");
    }

    #[tokio::test]
    async fn test_welcome_keyboards() {
        let handler = handler().await;
        handler.dispatch(&inbound(ADMIN, "/start")).await;
        handler.dispatch(&inbound(USER, "/help")).await;

        let sent = handler.monitor.dispatcher().sender().sent();
        let admin = sent.iter().find(|m| m.chat_id == ADMIN).unwrap();
        assert!(admin.text.contains("ADMIN MODE"));
        assert!(admin.text.contains("Total Users: 1"));
        assert_eq!(admin.keyboard.as_ref().unwrap().keyboard.len(), 3);

        let user = sent.iter().find(|m| m.chat_id == USER).unwrap();
        assert!(!user.text.contains("ADMIN MODE"));
        assert!(user.text.contains("Total Users: 2"));
        assert_eq!(user.keyboard.as_ref().unwrap().keyboard.len(), 1);
    }

    #[tokio::test]
    async fn test_admin_commands_denied_for_users() {
        let handler = handler().await;
        for text in ["/start_monitor", "/stop_monitor", "/admin", "/users"] {
            handler.dispatch(&inbound(USER, text)).await;
        }

        let replies = replies(&handler, USER);
        assert_eq!(
            replies,
            vec![
                messages::DENIED_START,
                messages::DENIED_STOP,
                messages::DENIED_ADMIN,
                messages::DENIED_ADMIN,
            ]
        );
        assert!(!handler.scheduler.is_running());
    }

    #[tokio::test]
    async fn test_start_and_stop_monitor() {
        let handler = handler().await;

        handler.dispatch(&inbound(ADMIN, "/stop_monitor")).await;
        handler.dispatch(&inbound(ADMIN, "/start_monitor")).await;
        assert!(handler.scheduler.is_running());
        handler.dispatch(&inbound(ADMIN, "/start_monitor")).await;
        handler.dispatch(&inbound(ADMIN, "/stop_monitor")).await;
        assert!(!handler.scheduler.is_running());

        let replies = replies(&handler, ADMIN);
        assert_eq!(replies[0], messages::NOT_RUNNING);
        assert!(replies.iter().any(|r| r.contains("STARTED")));
        assert!(replies.iter().any(|r| r.contains("TEST NOTIFICATION")));
        assert!(replies.iter().any(|r| r == messages::ALREADY_RUNNING));
        assert!(replies.iter().any(|r| r == messages::STOPPED));
    }

    #[tokio::test]
    async fn test_check_now_reports_counts() {
        let handler = handler().await;
        handler.dispatch(&inbound(USER, "/check_now")).await;

        let replies = replies(&handler, USER);
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0], messages::CHECKING);
        assert!(replies[1].contains("Men's Items: 5"));
        assert!(replies[1].contains("Women's Items: 10"));
    }

    #[tokio::test]
    async fn test_check_now_extraction_failure() {
        let handler = handler().await;
        handler.monitor.source().set(0, 0);

        handler.dispatch(&inbound(USER, "/check_now")).await;
        let replies = replies(&handler, USER);
        assert_eq!(replies, vec![messages::CHECKING, messages::EXTRACTION_FAILED]);
    }

    #[tokio::test]
    async fn test_status_and_users() {
        let handler = handler().await;
        handler.dispatch(&inbound(USER, "/status")).await;
        handler.dispatch(&inbound(ADMIN, "/users")).await;
        handler.dispatch(&inbound(ADMIN, "/admin")).await;

        let user_replies = replies(&handler, USER);
        assert!(user_replies[0].contains("No stock data collected yet"));
        assert!(user_replies[0].contains("🔴 STOPPED"));

        let admin_replies = replies(&handler, ADMIN);
        assert!(admin_replies[0].contains("Total Users: 2"));
        assert!(admin_replies[0].contains("• Asha Rao (@asha) - 100"));
        assert!(admin_replies[1].contains("Admin Users: 1"));
        assert!(admin_replies[1].contains("Your ID: 100"));
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let handler = handler().await;
        handler.dispatch(&inbound(USER, "what's in stock?")).await;
        assert_eq!(replies(&handler, USER), vec![messages::UNKNOWN_COMMAND]);
    }

    #[tokio::test]
    async fn test_errors_answered_with_retry_text() {
        let handler = handler().await;
        sqlx::query("DROP TABLE stock_history")
            .execute(handler.monitor.db().pool())
            .await
            .unwrap();

        handler.dispatch(&inbound(USER, "/status")).await;
        assert_eq!(replies(&handler, USER), vec![messages::TRY_AGAIN]);
    }
}
