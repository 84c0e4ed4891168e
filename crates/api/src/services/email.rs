//! Email delivery for ticket confirmations and announcements.
//!
//! Supports two providers:
//! - `console`: Logs emails instead of sending them (development)
//! - `sendgrid`: Uses the SendGrid v3 API

use crate::config::EmailConfig;
use reqwest::Client;
use shared::markup::{escape_html, text_to_html};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

const EMAIL_TIMEOUT_SECS: u64 = 10;

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Unknown email provider: {0}")]
    UnknownProvider(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
}

impl EmailMessage {
    /// Builds a message from a title and a plain text body.
    pub fn from_text(to: &str, title: &str, body: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: title.to_string(),
            body_text: body.to_string(),
            body_html: Some(format!(
                "<h2>{}</h2>\n<p>{}</p>",
                escape_html(title),
                text_to_html(body)
            )),
        }
    }
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    client: Client,
}

impl EmailService {
    /// Creates a new EmailService with the given configuration.
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(EMAIL_TIMEOUT_SECS))
            .build()
            .map_err(|e| EmailError::SendFailed(e.to_string()))?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Send an email message. A disabled service drops it silently.
    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if !self.config.enabled {
            debug!(
                to = %message.to,
                subject = %message.subject,
                "Email service disabled, skipping send"
            );
            return Ok(());
        }

        match self.config.provider.as_str() {
            "console" => {
                info!(
                    to = %message.to,
                    subject = %message.subject,
                    body = %message.body_text,
                    "Email (console provider)"
                );
                Ok(())
            }
            "sendgrid" => self.send_sendgrid(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::UnknownProvider(provider.to_string()))
            }
        }
    }

    async fn send_sendgrid(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let mut content = vec![serde_json::json!({
            "type": "text/plain",
            "value": message.body_text
        })];
        if let Some(html) = &message.body_html {
            content.push(serde_json::json!({"type": "text/html", "value": html}));
        }

        let body = serde_json::json!({
            "personalizations": [{"to": [{"email": message.to}]}],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": message.subject,
            "content": content
        });

        let response = self
            .client
            .post(&self.config.sendgrid_api_url)
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(to = %message.to, subject = %message.subject, "Email sent via SendGrid");
            Ok(())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            Err(EmailError::ProviderError(format!(
                "SendGrid returned {}: {}",
                status, error_body
            )))
        }
    }
}
