//! Payment processor events and checkout sessions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Event type delivered when a checkout is paid.
pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: WebhookData,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ObjectId {
    id: String,
}

/// A verified webhook delivery, classified by type.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentEvent {
    CheckoutCompleted {
        event_id: String,
        session_id: String,
        /// Session object as delivered, kept on issued tickets.
        snapshot: serde_json::Value,
    },
    Unhandled {
        event_id: String,
        event_type: String,
    },
}

impl PaymentEvent {
    /// Parses a raw webhook body.
    pub fn parse(payload: &[u8]) -> Result<Self, serde_json::Error> {
        let envelope: WebhookEnvelope = serde_json::from_slice(payload)?;
        if envelope.event_type != CHECKOUT_SESSION_COMPLETED {
            return Ok(PaymentEvent::Unhandled {
                event_id: envelope.id,
                event_type: envelope.event_type,
            });
        }

        let ObjectId { id } = serde_json::from_value(envelope.data.object.clone())?;
        Ok(PaymentEvent::CheckoutCompleted {
            event_id: envelope.id,
            session_id: id,
            snapshot: envelope.data.object,
        })
    }
}

/// Authoritative checkout session fetched from the processor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub payment_intent: Option<String>,
    pub customer_email: Option<String>,
    pub metadata: HashMap<String, String>,
    /// Unix seconds.
    pub created: i64,
    pub line_items: Vec<LineItem>,
}

impl CheckoutSession {
    /// Non-empty metadata value for `key`.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn total_quantity(&self) -> i64 {
        self.line_items.iter().map(|i| i.quantity.max(0)).sum()
    }
}

/// One purchased price within a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItem {
    pub price_id: String,
    pub product_id: Option<String>,
    pub payment_link: Option<String>,
    pub quantity: i64,
    /// Minor currency units.
    pub unit_amount: Option<i64>,
    pub currency: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_checkout_completed() {
        let body = json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": {"object": {"id": "cs_test_1", "customer_email": "a@b.c"}}
        });
        let event = PaymentEvent::parse(body.to_string().as_bytes()).unwrap();
        match event {
            PaymentEvent::CheckoutCompleted { event_id, session_id, snapshot } => {
                assert_eq!(event_id, "evt_1");
                assert_eq!(session_id, "cs_test_1");
                assert_eq!(snapshot["customer_email"], "a@b.c");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_parse_unhandled_type() {
        let body = json!({
            "id": "evt_2",
            "type": "invoice.paid",
            "data": {"object": {"id": "in_1"}}
        });
        assert_eq!(
            PaymentEvent::parse(body.to_string().as_bytes()).unwrap(),
            PaymentEvent::Unhandled {
                event_id: "evt_2".into(),
                event_type: "invoice.paid".into()
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(PaymentEvent::parse(b"not json").is_err());
        assert!(PaymentEvent::parse(br#"{"type":"checkout.session.completed"}"#).is_err());

        let no_session_id = json!({
            "id": "evt_3",
            "type": "checkout.session.completed",
            "data": {"object": {}}
        });
        assert!(PaymentEvent::parse(no_session_id.to_string().as_bytes()).is_err());
    }

    #[test]
    fn test_metadata_value_ignores_blank() {
        let mut session = CheckoutSession::default();
        session.metadata.insert("user_slug".into(), "  ".into());
        session.metadata.insert("user_id".into(), "abc".into());
        assert_eq!(session.metadata_value("user_slug"), None);
        assert_eq!(session.metadata_value("user_id"), Some("abc"));
        assert_eq!(session.metadata_value("missing"), None);
    }

    #[test]
    fn test_total_quantity() {
        let session = CheckoutSession {
            line_items: vec![
                LineItem { quantity: 2, ..Default::default() },
                LineItem { quantity: 3, ..Default::default() },
            ],
            ..Default::default()
        };
        assert_eq!(session.total_quantity(), 5);
    }
}
