//! Ticket type domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A purchasable category of tickets within an event.
///
/// Negative `limit_quantity` / `limit_per_user` mean "unlimited".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TicketType {
    pub id: Uuid,
    pub event_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub currency: String,
    pub stripe_price_id: Option<String>,
    pub stripe_product_id: Option<String>,
    pub stripe_payment_link_id: Option<String>,
    pub welcome_message_title: Option<String>,
    pub welcome_message_text: Option<String>,
    /// Cached count of tickets of this type, re-derived on every sale.
    pub tickets_sold: i32,
    pub limit_quantity: i32,
    pub limit_per_user: i32,
    /// Ordered checklist ids shown to holders of this type.
    pub checklists: Vec<String>,
    /// Out-of-band types (staff, comps) are ignored by the event sold-out check.
    pub special_code: Option<String>,
    pub is_sold_out: bool,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TicketType {
    pub fn has_per_user_limit(&self) -> bool {
        self.limit_per_user > 0
    }

    pub fn is_special(&self) -> bool {
        self.special_code.is_some()
    }

    /// Tickets still available for display, `-1` when unlimited.
    pub fn left_tickets_count(&self) -> i32 {
        if self.limit_quantity > 0 {
            (self.limit_quantity - self.tickets_sold).max(0)
        } else {
            -1
        }
    }
}

/// Public view of a ticket type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TicketTypeResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub currency: String,
    pub tickets_left: i32,
    pub limit_per_user: i32,
    pub is_sold_out: bool,
}

impl From<TicketType> for TicketTypeResponse {
    fn from(t: TicketType) -> Self {
        Self {
            tickets_left: t.left_tickets_count(),
            id: t.id,
            name: t.name,
            description: t.description,
            price: t.price,
            currency: t.currency,
            limit_per_user: t.limit_per_user,
            is_sold_out: t.is_sold_out,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_ticket_type() -> TicketType {
        let now = Utc::now();
        TicketType {
            id: Uuid::new_v4(),
            event_id: "camp2026".to_string(),
            name: "Early Bird".to_string(),
            description: None,
            price: 120.0,
            currency: "eur".to_string(),
            stripe_price_id: Some("price_early".to_string()),
            stripe_product_id: Some("prod_early".to_string()),
            stripe_payment_link_id: None,
            welcome_message_title: None,
            welcome_message_text: None,
            tickets_sold: 0,
            limit_quantity: -1,
            limit_per_user: -1,
            checklists: vec![],
            special_code: None,
            is_sold_out: false,
            is_visible: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_left_tickets_count_unlimited() {
        let t = sample_ticket_type();
        assert_eq!(t.left_tickets_count(), -1);
    }

    #[test]
    fn test_left_tickets_count_limited() {
        let mut t = sample_ticket_type();
        t.limit_quantity = 10;
        t.tickets_sold = 7;
        assert_eq!(t.left_tickets_count(), 3);

        t.tickets_sold = 12;
        assert_eq!(t.left_tickets_count(), 0);
    }

    #[test]
    fn test_zero_limit_displays_as_unlimited() {
        let mut t = sample_ticket_type();
        t.limit_quantity = 0;
        assert_eq!(t.left_tickets_count(), -1);
    }

    #[test]
    fn test_per_user_limit_only_when_positive() {
        let mut t = sample_ticket_type();
        assert!(!t.has_per_user_limit());
        t.limit_per_user = 0;
        assert!(!t.has_per_user_limit());
        t.limit_per_user = 2;
        assert!(t.has_per_user_limit());
    }

    #[test]
    fn test_response_hides_payment_identifiers() {
        let mut t = sample_ticket_type();
        t.limit_quantity = 5;
        t.tickets_sold = 2;
        let json = serde_json::to_value(TicketTypeResponse::from(t)).unwrap();
        assert_eq!(json["tickets_left"], 3);
        assert!(json.get("stripe_price_id").is_none());
    }
}
