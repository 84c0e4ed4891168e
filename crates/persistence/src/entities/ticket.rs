//! Ticket entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the tickets table.
#[derive(Debug, Clone, FromRow)]
pub struct TicketEntity {
    pub id: Uuid,
    pub code: i32,
    pub user_id: Option<Uuid>,
    pub customer_email: Option<String>,
    pub payment_id: Option<String>,
    pub event_id: String,
    pub ticket_type_id: Uuid,
    pub metadata: serde_json::Value,
    pub session: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<TicketEntity> for domain::models::Ticket {
    fn from(entity: TicketEntity) -> Self {
        Self {
            id: entity.id,
            code: entity.code,
            user_id: entity.user_id,
            customer_email: entity.customer_email,
            payment_id: entity.payment_id,
            event_id: entity.event_id,
            ticket_type_id: entity.ticket_type_id,
            metadata: entity.metadata,
            session: entity.session,
            created_at: entity.created_at,
        }
    }
}

/// A ticket joined with the names of its event and type.
#[derive(Debug, Clone, FromRow)]
pub struct HeldTicketEntity {
    #[sqlx(flatten)]
    pub ticket: TicketEntity,
    pub event_title: String,
    pub event_starts_at: Option<DateTime<Utc>>,
    pub ticket_type_name: String,
}
