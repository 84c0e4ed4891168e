//! Notification service for purchase confirmations and announcements.
//!
//! Delivery is best-effort: implementations report per-channel outcomes and
//! never return errors to the caller.

use std::sync::{Arc, Mutex};

use crate::models::TicketType;

const DEFAULT_CONFIRMATION_TITLE: &str = "Your ticket is confirmed";
const DEFAULT_CONFIRMATION_BODY: &str =
    "Thank you for your purchase! Your ticket is waiting for you in your profile.";

/// A message addressed to a person over any channels they have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub email: Option<String>,
    pub chat_id: Option<String>,
    pub title: String,
    /// Plain text; channels escape it for their own format.
    pub body: String,
}

impl NotificationRequest {
    /// Purchase confirmation for a ticket type, using its welcome message.
    pub fn purchase_confirmation(
        ticket_type: &TicketType,
        email: Option<String>,
        chat_id: Option<String>,
    ) -> Self {
        let title = ticket_type
            .welcome_message_title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_CONFIRMATION_TITLE)
            .to_string();
        let body = ticket_type
            .welcome_message_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_CONFIRMATION_BODY)
            .to_string();
        Self {
            email,
            chat_id,
            title,
            body,
        }
    }

    /// Announcement that ticket sales for an event have opened.
    pub fn sale_announcement(
        event_title: &str,
        email: Option<String>,
        chat_id: Option<String>,
    ) -> Self {
        Self {
            email,
            chat_id,
            title: format!("Tickets for {} are on sale", event_title),
            body: format!(
                "Sales for {} are open. Grab your ticket while they last!",
                event_title
            ),
        }
    }

    pub fn has_recipient(&self) -> bool {
        self.email.is_some() || self.chat_id.is_some()
    }
}

/// Result of one channel delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    Sent,
    Failed(String),
}

/// Per-channel result; `None` when the recipient had no address there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub email: Option<ChannelOutcome>,
    pub chat: Option<ChannelOutcome>,
}

impl DeliveryReport {
    pub fn any_sent(&self) -> bool {
        [&self.email, &self.chat]
            .iter()
            .any(|o| matches!(o, Some(ChannelOutcome::Sent)))
    }

    pub fn failures(&self) -> usize {
        [&self.email, &self.chat]
            .iter()
            .filter(|o| matches!(o, Some(ChannelOutcome::Failed(_))))
            .count()
    }
}

/// Notification service trait.
#[async_trait::async_trait]
pub trait NotificationService: Send + Sync {
    /// Delivers the message over every channel the request addresses.
    async fn notify(&self, request: NotificationRequest) -> DeliveryReport;
}

/// Mock notification service for development and testing.
///
/// Records requests instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct MockNotificationService {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
    sent: Arc<Mutex<Vec<NotificationRequest>>>,
}

impl MockNotificationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock service that simulates failures.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// Requests received so far.
    pub fn sent(&self) -> Vec<NotificationRequest> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl NotificationService for MockNotificationService {
    async fn notify(&self, request: NotificationRequest) -> DeliveryReport {
        let outcome = || {
            if self.simulate_failure {
                ChannelOutcome::Failed("Simulated failure".to_string())
            } else {
                ChannelOutcome::Sent
            }
        };
        let report = DeliveryReport {
            email: request.email.as_ref().map(|_| outcome()),
            chat: request.chat_id.as_ref().map(|_| outcome()),
        };

        tracing::info!(
            title = %request.title,
            has_email = request.email.is_some(),
            has_chat = request.chat_id.is_some(),
            "Mock: Would send notification"
        );

        if let Ok(mut sent) = self.sent.lock() {
            sent.push(request);
        }
        report
    }
}
