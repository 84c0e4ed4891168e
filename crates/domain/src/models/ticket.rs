//! Ticket domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An issued admission ticket.
///
/// `code` is unique within its event and never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Ticket {
    pub id: Uuid,
    pub code: i32,
    pub user_id: Option<Uuid>,
    pub customer_email: Option<String>,
    pub payment_id: Option<String>,
    pub event_id: String,
    pub ticket_type_id: Uuid,
    pub metadata: serde_json::Value,
    /// Raw checkout session snapshot the ticket was issued from.
    #[serde(skip_serializing)]
    pub session: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == Some(user_id)
    }
}

/// Purchase details stored alongside a ticket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_paid: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Unix seconds of the checkout session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchased_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl TicketMetadata {
    /// Metadata for a ticket paid through the payment processor.
    pub fn purchase(unit_amount: Option<i64>, currency: &str, purchased_at: i64) -> Self {
        Self {
            price_paid: unit_amount.map(|cents| cents as f64 / 100.0),
            currency: Some(currency.to_string()),
            purchased_at: Some(purchased_at),
            source: None,
        }
    }

    /// Metadata for a ticket granted by an administrative tool.
    pub fn granted_by(source: &str) -> Self {
        Self {
            source: Some(source.to_string()),
            ..Self::default()
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }
}

/// Public view of a ticket for its holder.
#[derive(Debug, Clone, Serialize)]
pub struct TicketResponse {
    pub id: Uuid,
    pub code: i32,
    pub event_id: String,
    pub ticket_type_id: Uuid,
    pub customer_email: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<Ticket> for TicketResponse {
    fn from(t: Ticket) -> Self {
        Self {
            id: t.id,
            code: t.code,
            event_id: t.event_id,
            ticket_type_id: t.ticket_type_id,
            customer_email: t.customer_email,
            metadata: t.metadata,
            created_at: t.created_at,
        }
    }
}
