//! Event subscription entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::SubscriptionTopic;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the event_subscriptions table.
#[derive(Debug, Clone, FromRow)]
pub struct EventSubscriptionEntity {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub event_id: String,
    pub email: String,
    pub topic: String,
    pub created_at: DateTime<Utc>,
}

impl From<EventSubscriptionEntity> for domain::models::EventSubscription {
    fn from(entity: EventSubscriptionEntity) -> Self {
        Self {
            topic: entity.topic.parse().unwrap_or(SubscriptionTopic::All),
            id: entity.id,
            user_id: entity.user_id,
            event_id: entity.event_id,
            email: entity.email,
            created_at: entity.created_at,
        }
    }
}

/// Subscriber joined with the linked member's chat id.
#[derive(Debug, Clone, FromRow)]
pub struct AnnouncementRecipientEntity {
    pub email: String,
    pub telegram_id: Option<String>,
}

impl From<AnnouncementRecipientEntity> for domain::models::AnnouncementRecipient {
    fn from(entity: AnnouncementRecipientEntity) -> Self {
        Self {
            email: entity.email,
            telegram_id: entity.telegram_id,
        }
    }
}
