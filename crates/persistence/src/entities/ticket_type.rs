//! Ticket type entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the ticket_types table.
#[derive(Debug, Clone, FromRow)]
pub struct TicketTypeEntity {
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
    pub tickets_sold: i32,
    pub limit_quantity: i32,
    pub limit_per_user: i32,
    pub checklists: Vec<String>,
    pub special_code: Option<String>,
    pub is_sold_out: bool,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TicketTypeEntity> for domain::models::TicketType {
    fn from(entity: TicketTypeEntity) -> Self {
        Self {
            id: entity.id,
            event_id: entity.event_id,
            name: entity.name,
            description: entity.description,
            price: entity.price,
            currency: entity.currency,
            stripe_price_id: entity.stripe_price_id,
            stripe_product_id: entity.stripe_product_id,
            stripe_payment_link_id: entity.stripe_payment_link_id,
            welcome_message_title: entity.welcome_message_title,
            welcome_message_text: entity.welcome_message_text,
            tickets_sold: entity.tickets_sold,
            limit_quantity: entity.limit_quantity,
            limit_per_user: entity.limit_per_user,
            checklists: entity.checklists,
            special_code: entity.special_code,
            is_sold_out: entity.is_sold_out,
            is_visible: entity.is_visible,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
