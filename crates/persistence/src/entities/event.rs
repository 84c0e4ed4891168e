//! Event entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the events table.
#[derive(Debug, Clone, FromRow)]
pub struct EventEntity {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub sale_starts_at: Option<DateTime<Utc>>,
    pub sale_ends_at: Option<DateTime<Utc>>,
    pub event_starts_at: Option<DateTime<Utc>>,
    pub event_ends_at: Option<DateTime<Utc>>,
    pub is_visible: bool,
    pub is_sold_out: bool,
    pub ticket_sequence: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventEntity> for domain::models::Event {
    fn from(entity: EventEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            description: entity.description,
            location: entity.location,
            sale_starts_at: entity.sale_starts_at,
            sale_ends_at: entity.sale_ends_at,
            event_starts_at: entity.event_starts_at,
            event_ends_at: entity.event_ends_at,
            is_visible: entity.is_visible,
            is_sold_out: entity.is_sold_out,
            ticket_sequence: entity.ticket_sequence,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
