//! Message texts (Telegram HTML).

use std::time::Duration;

use chrono::Local;
use database::{Category, Recipient, StockObservation};
use telegram_client::ReplyKeyboardMarkup;

use crate::detector::Evaluation;
use crate::dispatcher::BroadcastReport;

/// Users listed by `/users`.
pub const USER_LIST_LIMIT: usize = 10;

pub const CHECKING: &str = "🔍 Checking stock immediately...";
pub const EXTRACTION_FAILED: &str = "❌ Could not retrieve stock count. Please try again later.";
pub const ALREADY_RUNNING: &str = "🔄 Monitoring is already running!";
pub const NOT_RUNNING: &str = "❌ Monitoring is not running!";
pub const STOPPED: &str = "🛑 Monitoring stopped!";
pub const NO_USERS: &str = "❌ No users found in the database.";
pub const UNKNOWN_COMMAND: &str = "❌ Unknown command. Use /start to see available commands.";
pub const TRY_AGAIN: &str = "❌ Error processing command. Please try again.";
pub const DENIED_START: &str = "❌ Access Denied! Only administrators can start monitoring.";
pub const DENIED_STOP: &str = "❌ Access Denied! Only administrators can stop monitoring.";
pub const DENIED_ADMIN: &str = "❌ Access Denied! Admin command only.";

/// Current local time as `YYYY-MM-DD HH:MM:SS`.
pub fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Escape text for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn running_label(running: bool) -> &'static str {
    if running {
        "🟢 RUNNING"
    } else {
        "🔴 STOPPED"
    }
}

/// Broadcast alert for a threshold crossing.
pub fn stock_alert(
    category: Category,
    increase: i64,
    current: i64,
    previous: i64,
    source_url: &str,
) -> String {
    let (icon, headline) = match category {
        Category::Men => ("👕", "Men's Stock Increased!"),
        Category::Women => ("👚", "Women's Stock Increased Significantly!"),
    };
    let label = category.label();
    format!(
        "🚨 <b>{upper} STOCK ALERT!</b> 🚨\n\n\
         {icon} <b>{headline}</b>\n\n\
         📈 Change: +{increase} items\n\
         📊 Current {label}: {current} items\n\
         📉 Previous {label}: {previous} items\n\n\
         🔗 Check Now: {url}\n\n\
         ⏰ Alert Time: {time}\n\n\
         ⚡ Quick! New {label} items available!",
        upper = label.to_uppercase(),
        url = escape_html(source_url),
        time = timestamp(),
    )
}

/// Delivery report sent to the operator after an alert broadcast.
pub fn operator_report(category: Category, increase: i64, report: &BroadcastReport) -> String {
    let label = category.label();
    format!(
        "📊 <b>{upper} STOCK ALERT REPORT</b>\n\n\
         ✅ Alert sent successfully!\n\
         👥 Recipients: {sent}/{total} users\n\
         📈 {label} Stock Increase: +{increase}\n\
         🕒 Time: {time}",
        upper = label.to_uppercase(),
        sent = report.sent,
        total = report.total,
        time = timestamp(),
    )
}

/// Reply to a manual check.
pub fn status_report(eval: &Evaluation, source_url: &str) -> String {
    format!(
        "📊 <b>CURRENT STOCK STATUS:</b>\n\n\
         👕 Men's Items: {men}\n\
         👚 Women's Items: {women}\n\
         🔄 Total Items: {total}\n\n\
         📈 Change from last check:\n\
         \u{20}\u{20}\u{20}• Men: {men_change}\n\
         \u{20}\u{20}\u{20}• Women: {women_change}\n\n\
         ⏰ Last Updated: {time}\n\n\
         🔗 {url}",
        men = eval.current.men,
        women = eval.current.women,
        total = eval.current.total(),
        men_change = eval.men_change(),
        women_change = eval.women_change(),
        time = timestamp(),
        url = escape_html(source_url),
    )
}

/// Confirms that alerts can be delivered.
pub fn test_notification(source_url: &str) -> String {
    format!(
        "🧪 <b>TEST NOTIFICATION - Stock Monitor</b>\n\n\
         ✅ Your stock monitor is working correctly!\n\
         🤖 Bot is active and ready to send alerts\n\
         📱 You will receive notifications when stock increases\n\n\
         🔗 Monitoring: {url}\n\n\
         ⏰ Test Time: {time}\n\n\
         🎉 Everything is set up properly!",
        url = escape_html(source_url),
        time = timestamp(),
    )
}

/// Reply to `/start` and `/help`.
pub fn welcome(is_admin: bool, user_count: i64) -> String {
    if is_admin {
        format!(
            "🤖 <b>Welcome to Stock Monitor - ADMIN MODE</b>\n\n\
             You have administrator privileges.\n\n\
             Available Commands:\n\
             • /start_monitor - Start automatic monitoring (Admin only)\n\
             • /stop_monitor - Stop monitoring (Admin only)\n\
             • /check_now - Check stock immediately\n\
             • /status - Current monitor status\n\
             • /admin - Admin information\n\
             • /users - User statistics\n\n\
             👥 Total Users: {user_count}\n\n\
             Use the buttons below to control the monitor!"
        )
    } else {
        format!(
            "🤖 <b>Welcome to Stock Monitor!</b>\n\n\
             I will monitor stock and alert you when new items are added.\n\n\
             Available Commands:\n\
             • /check_now - Check stock immediately\n\
             • /status - Current monitor status\n\n\
             👥 Total Users: {user_count}\n\n\
             Use the buttons below to interact with the monitor!"
        )
    }
}

/// Reply to a successful `/start_monitor`.
pub fn started(user_count: i64) -> String {
    format!(
        "✅ Stock Monitor STARTED! Bot is now actively monitoring stock for {} users.",
        user_count
    )
}

/// Reply to `/status`.
pub fn status(
    running: bool,
    user_count: i64,
    interval: Duration,
    latest: Option<&StockObservation>,
    source_url: &str,
) -> String {
    let header = format!(
        "🤖 <b>STOCK MONITOR STATUS</b>\n\n\
         📊 Monitor Status: {status}\n\
         👥 Total Users: {user_count}\n\
         ⏰ Last Check: {last}\n\
         🔄 Check Interval: {secs} seconds\n\n",
        status = running_label(running),
        last = latest.map(|obs| obs.created_at.as_str()).unwrap_or("Never"),
        secs = interval.as_secs(),
    );

    let body = match latest {
        Some(obs) => format!(
            "📈 Latest Stock Data:\n\
             \u{20}\u{20}\u{20}• Men's Items: {}\n\
             \u{20}\u{20}\u{20}• Women's Items: {}\n\
             \u{20}\u{20}\u{20}• Total Items: {}\n\n",
            obs.men_count, obs.women_count, obs.total_stock
        ),
        None => "📈 No stock data collected yet.\n\n".to_string(),
    };

    format!("{}{}🔗 Monitoring: {}", header, body, escape_html(source_url))
}

/// Reply to `/admin`.
pub fn admin_info(running: bool, user_count: i64, admin_count: usize, caller_id: &str) -> String {
    format!(
        "👑 <b>ADMIN INFORMATION</b>\n\n\
         🤖 Bot Status: {status}\n\
         👥 Total Users: {user_count}\n\
         👑 Admin Users: {admin_count}\n\
         📱 Your ID: {caller}\n\
         ⏰ Server Time: {time}\n\n\
         You have full control over the monitor.",
        status = running_label(running),
        caller = escape_html(caller_id),
        time = timestamp(),
    )
}

/// Reply to `/users`. Lists at most [`USER_LIST_LIMIT`] users.
pub fn users(recipients: &[Recipient]) -> String {
    if recipients.is_empty() {
        return NO_USERS.to_string();
    }

    let mut list = recipients
        .iter()
        .take(USER_LIST_LIMIT)
        .map(|r| {
            format!(
                "• {} (@{}) - {}",
                escape_html(&r.display_name),
                escape_html(&r.username),
                r.user_id
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    if recipients.len() > USER_LIST_LIMIT {
        list.push_str(&format!(
            "\n• ... and {} more users",
            recipients.len() - USER_LIST_LIMIT
        ));
    }

    format!(
        "👥 <b>USER STATISTICS</b>\n\n\
         📊 Total Users: {count}\n\n\
         👤 Recent Users:\n\
         {list}\n\n\
         ⏰ Last Updated: {time}",
        count = recipients.len(),
        time = timestamp(),
    )
}

/// Reply keyboard for admins (three rows) or regular users (one row).
pub fn keyboard(is_admin: bool) -> ReplyKeyboardMarkup {
    if is_admin {
        ReplyKeyboardMarkup::from_rows([
            ["/start_monitor", "/stop_monitor"],
            ["/check_now", "/status"],
            ["/admin", "/users"],
        ])
    } else {
        ReplyKeyboardMarkup::from_rows([["/check_now", "/status"]])
    }
}
