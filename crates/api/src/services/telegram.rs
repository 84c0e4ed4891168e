//! Telegram Bot API client.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::TelegramConfig;
use shared::markup::escape_html;

const TELEGRAM_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("Telegram is not enabled")]
    NotEnabled,

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    ApiError(String),
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends messages to chats through a bot.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    config: TelegramConfig,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> Result<Self, TelegramError> {
        if !config.enabled {
            return Err(TelegramError::NotEnabled);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(TELEGRAM_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, config })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    /// Sends an HTML-formatted message without link previews.
    pub async fn send_message(&self, chat_id: &str, html: &str) -> Result<(), TelegramError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&serde_json::json!({
                "chat_id": chat_id,
                "text": html,
                "parse_mode": "HTML",
                "disable_web_page_preview": true,
            }))
            .send()
            .await?;

        let status = response.status();
        let body: ApiResponse = response.json().await?;
        if status.is_success() && body.ok {
            tracing::debug!(chat_id = %chat_id, "Telegram message sent");
            Ok(())
        } else {
            Err(TelegramError::ApiError(
                body.description
                    .unwrap_or_else(|| format!("status {}", status)),
            ))
        }
    }
}

/// Message text as shown in the chat, escaped for HTML parse mode.
pub fn format_message(title: &str, body: &str) -> String {
    format!("<b>{}</b>\n\n{}", escape_html(title), escape_html(body))
}
