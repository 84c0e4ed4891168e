//! Event subscription repository.

use domain::models::SubscriptionTopic;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{AnnouncementRecipientEntity, EventSubscriptionEntity};

/// Repository for event announcement subscriptions.
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    /// Creates a new SubscriptionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Subscribe an e-mail to an event topic. Existing subscriptions are kept.
    pub async fn subscribe(
        &self,
        user_id: Option<Uuid>,
        event_id: &str,
        email: &str,
        topic: SubscriptionTopic,
    ) -> Result<EventSubscriptionEntity, sqlx::Error> {
        sqlx::query_as::<_, EventSubscriptionEntity>(
            r#"
            INSERT INTO event_subscriptions (user_id, event_id, email, topic)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (event_id, email, topic)
            DO UPDATE SET user_id = COALESCE(EXCLUDED.user_id, event_subscriptions.user_id)
            RETURNING id, user_id, event_id, email, topic, created_at
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .bind(email)
        .bind(topic.as_str())
        .fetch_one(&self.pool)
        .await
    }

    /// Remove a user's subscriptions to a topic. Returns rows deleted.
    pub async fn unsubscribe(
        &self,
        user_id: Uuid,
        event_id: &str,
        topic: SubscriptionTopic,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM event_subscriptions WHERE user_id = $1 AND event_id = $2 AND topic = $3",
        )
        .bind(user_id)
        .bind(event_id)
        .bind(topic.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// A user's subscriptions to one event.
    pub async fn find_for_user(
        &self,
        event_id: &str,
        user_id: Uuid,
    ) -> Result<Vec<EventSubscriptionEntity>, sqlx::Error> {
        sqlx::query_as::<_, EventSubscriptionEntity>(
            r#"
            SELECT id, user_id, event_id, email, topic, created_at
            FROM event_subscriptions
            WHERE event_id = $1 AND user_id = $2
            ORDER BY topic ASC
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Distinct subscribers of any of `topics`, with linked chat ids.
    pub async fn find_recipients(
        &self,
        event_id: &str,
        topics: &[SubscriptionTopic],
    ) -> Result<Vec<AnnouncementRecipientEntity>, sqlx::Error> {
        let topics: Vec<&str> = topics.iter().map(|t| t.as_str()).collect();
        sqlx::query_as::<_, AnnouncementRecipientEntity>(
            r#"
            SELECT DISTINCT ON (LOWER(s.email)) s.email, u.telegram_id
            FROM event_subscriptions s
            LEFT JOIN users u ON u.id = s.user_id
            WHERE s.event_id = $1 AND s.topic = ANY($2)
            ORDER BY LOWER(s.email), u.telegram_id NULLS LAST
            "#,
        )
        .bind(event_id)
        .bind(&topics)
        .fetch_all(&self.pool)
        .await
    }
}
