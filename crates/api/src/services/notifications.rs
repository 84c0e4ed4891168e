//! Notification dispatcher: e-mail plus Telegram, each best-effort.

use async_trait::async_trait;
use domain::services::{ChannelOutcome, DeliveryReport, NotificationRequest, NotificationService};

use crate::middleware::metrics::record_notification;

use super::email::{EmailMessage, EmailService};
use super::telegram::{format_message, TelegramClient};

/// Sends each request over every channel it addresses. Channels fail
/// independently; failures are logged and reported, never returned.
#[derive(Clone)]
pub struct NotificationDispatcher {
    email: EmailService,
    telegram: Option<TelegramClient>,
}

impl NotificationDispatcher {
    /// `telegram` is `None` when the bot is not configured; chat addresses
    /// are then skipped.
    pub fn new(email: EmailService, telegram: Option<TelegramClient>) -> Self {
        Self { email, telegram }
    }

    async fn send_email(&self, to: &str, request: &NotificationRequest) -> ChannelOutcome {
        let message = EmailMessage::from_text(to, &request.title, &request.body);
        match self.email.send(message).await {
            Ok(()) => ChannelOutcome::Sent,
            Err(e) => {
                tracing::warn!(channel = "email", to = %to, error = %e, "Notification failed");
                ChannelOutcome::Failed(e.to_string())
            }
        }
    }

    async fn send_chat(&self, chat_id: &str, request: &NotificationRequest) -> ChannelOutcome {
        let Some(telegram) = &self.telegram else {
            return ChannelOutcome::Failed("Telegram is not configured".to_string());
        };
        let text = format_message(&request.title, &request.body);
        match telegram.send_message(chat_id, &text).await {
            Ok(()) => ChannelOutcome::Sent,
            Err(e) => {
                tracing::warn!(channel = "telegram", chat_id = %chat_id, error = %e, "Notification failed");
                ChannelOutcome::Failed(e.to_string())
            }
        }
    }
}

#[async_trait]
impl NotificationService for NotificationDispatcher {
    async fn notify(&self, request: NotificationRequest) -> DeliveryReport {
        let email = match &request.email {
            Some(to) => Some(self.send_email(to, &request).await),
            None => None,
        };
        let chat = match (&request.chat_id, &self.telegram) {
            (Some(chat_id), Some(_)) => Some(self.send_chat(chat_id, &request).await),
            (Some(chat_id), None) => {
                tracing::debug!(chat_id = %chat_id, "Telegram disabled, skipping chat");
                None
            }
            (None, _) => None,
        };

        if let Some(outcome) = &email {
            record_notification("email", *outcome == ChannelOutcome::Sent);
        }
        if let Some(outcome) = &chat {
            record_notification("telegram", *outcome == ChannelOutcome::Sent);
        }

        DeliveryReport { email, chat }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmailConfig;

    fn dispatcher(provider: &str) -> NotificationDispatcher {
        let email = EmailService::new(EmailConfig {
            enabled: true,
            provider: provider.to_string(),
            ..EmailConfig::default()
        })
        .unwrap();
        NotificationDispatcher::new(email, None)
    }

    fn request(email: Option<&str>, chat_id: Option<&str>) -> NotificationRequest {
        NotificationRequest {
            email: email.map(str::to_string),
            chat_id: chat_id.map(str::to_string),
            title: "Welcome".to_string(),
            body: "See you there".to_string(),
        }
    }

    #[tokio::test]
    async fn test_email_only() {
        let report = dispatcher("console")
            .notify(request(Some("a@example.com"), None))
            .await;
        assert_eq!(report.email, Some(ChannelOutcome::Sent));
        assert_eq!(report.chat, None);
        assert!(report.any_sent());
    }

    #[tokio::test]
    async fn test_chat_skipped_without_bot() {
        let report = dispatcher("console")
            .notify(request(Some("a@example.com"), Some("42")))
            .await;
        assert_eq!(report.chat, None);
    }

    #[tokio::test]
    async fn test_email_failure_is_reported_not_raised() {
        let report = dispatcher("pigeon")
            .notify(request(Some("a@example.com"), None))
            .await;
        assert!(matches!(report.email, Some(ChannelOutcome::Failed(_))));
        assert_eq!(report.failures(), 1);
    }
}
