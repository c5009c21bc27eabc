//! Telegram Bot API HTTP client.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::TelegramConfig;
use crate::error::TelegramError;
use crate::types::{
    ApiResponse, Chat, DeleteWebhookParams, GetChatParams, GetUpdatesParams, Message,
    SendMessageParams, Update, User, WebhookInfo,
};

/// Client for communicating with the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    config: TelegramConfig,
}

impl TelegramClient {
    /// Build a client without contacting the API.
    pub fn new(config: TelegramConfig) -> Result<Self, TelegramError> {
        if config.token.trim().is_empty() {
            return Err(TelegramError::Config("bot token is empty".to_string()));
        }

        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(TelegramError::Http)?;

        Ok(Self { http, config })
    }

    /// Build a client and verify the token with `getMe`.
    pub async fn connect(config: TelegramConfig) -> Result<Self, TelegramError> {
        let client = Self::new(config)?;
        let me = client.get_me().await?;
        info!(
            "Connected to Telegram Bot API as @{}",
            me.username.as_deref().unwrap_or("unknown")
        );
        Ok(client)
    }

    /// Get the bot's own account (health check).
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call::<(), _>("getMe", None, None).await
    }

    /// Remove any webhook so `getUpdates` can be used.
    pub async fn delete_webhook(&self) -> Result<bool, TelegramError> {
        self.call("deleteWebhook", Some(DeleteWebhookParams::default()), None)
            .await
    }

    /// Get the current webhook status.
    pub async fn get_webhook_info(&self) -> Result<WebhookInfo, TelegramError> {
        self.call::<(), _>("getWebhookInfo", None, None).await
    }

    /// Delete the webhook and confirm that polling mode is active.
    pub async fn ensure_polling_mode(&self) -> Result<(), TelegramError> {
        match self.delete_webhook().await {
            Ok(_) => debug!("Webhook deleted"),
            Err(e) => warn!("Failed to delete webhook: {}", e),
        }

        let info = self.get_webhook_info().await?;
        if info.url.is_empty() {
            info!("No active webhook, polling mode ready");
            Ok(())
        } else {
            Err(TelegramError::Conflict(format!(
                "webhook still active: {}",
                info.url
            )))
        }
    }

    /// Fetch updates after `offset`.
    ///
    /// `timeout` is the long-poll wait in seconds; the HTTP timeout is
    /// extended by the same amount.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout: u32,
    ) -> Result<Vec<Update>, TelegramError> {
        let params = GetUpdatesParams {
            offset,
            timeout,
            allowed_updates: vec!["message".to_string()],
        };
        let http_timeout = self.config.request_timeout + Duration::from_secs(u64::from(timeout));
        self.call("getUpdates", Some(params), Some(http_timeout))
            .await
    }

    /// Send a message using the full SendMessageParams structure.
    pub async fn send(&self, params: SendMessageParams) -> Result<Message, TelegramError> {
        self.call("sendMessage", Some(params), None).await
    }

    /// Look up a chat (for private chats, the user's profile).
    pub async fn get_chat(&self, chat_id: &str) -> Result<Chat, TelegramError> {
        let params = GetChatParams {
            chat_id: chat_id.to_string(),
        };
        self.call("getChat", Some(params), None).await
    }

    /// Make a Bot API call.
    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<P>,
        timeout: Option<Duration>,
    ) -> Result<R, TelegramError> {
        let url = self.config.method_url(method);
        debug!("Bot API call: {}", method);

        let mut request = self.http.post(&url);
        if let Some(params) = params {
            request = request.json(&params);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(TelegramError::Http)?;
        let status = response.status();
        let body = response.text().await.map_err(TelegramError::Http)?;

        decode_response(status, &body)
    }
}

/// Turn a raw Bot API response into a result.
fn decode_response<R: DeserializeOwned>(status: StatusCode, body: &str) -> Result<R, TelegramError> {
    let parsed: ApiResponse<R> = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) if status.is_success() => return Err(TelegramError::Json(e)),
        Err(_) => {
            return Err(TelegramError::Api {
                code: status.as_u16(),
                description: body.chars().take(200).collect(),
            })
        }
    };

    if status == StatusCode::CONFLICT || parsed.error_code == Some(409) {
        return Err(TelegramError::Conflict(
            parsed.description.unwrap_or_else(|| "conflict".to_string()),
        ));
    }

    if !parsed.ok {
        return Err(TelegramError::Api {
            code: parsed.error_code.unwrap_or_else(|| status.as_u16()),
            description: parsed.description.unwrap_or_default(),
        });
    }

    parsed.result.ok_or_else(|| TelegramError::Api {
        code: status.as_u16(),
        description: "No result in response".to_string(),
    })
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("config", &self.config)
            .finish()
    }
}
