//! Event repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::entities::EventEntity;
use crate::metrics::QueryTimer;

/// Fields for creating an event.
#[derive(Debug, Clone)]
pub struct NewEvent<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub sale_starts_at: Option<DateTime<Utc>>,
    pub sale_ends_at: Option<DateTime<Utc>>,
    pub event_starts_at: Option<DateTime<Utc>>,
    pub is_visible: bool,
}

/// Repository for event-related database operations.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Creates a new EventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Find an event by its slug.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_by_id");
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            SELECT id, title, description, location, sale_starts_at, sale_ends_at,
                   event_starts_at, event_ends_at, is_visible, is_sold_out,
                   ticket_sequence, created_at, updated_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Visible events that have a start date, soonest first.
    pub async fn find_visible_scheduled(&self) -> Result<Vec<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_visible_scheduled_events");
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            SELECT id, title, description, location, sale_starts_at, sale_ends_at,
                   event_starts_at, event_ends_at, is_visible, is_sold_out,
                   ticket_sequence, created_at, updated_at
            FROM events
            WHERE is_visible AND event_starts_at IS NOT NULL
            ORDER BY event_starts_at ASC, created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Create an event.
    pub async fn create(&self, event: NewEvent<'_>) -> Result<EventEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_event");
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            INSERT INTO events (id, title, sale_starts_at, sale_ends_at, event_starts_at, is_visible)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, location, sale_starts_at, sale_ends_at,
                      event_starts_at, event_ends_at, is_visible, is_sold_out,
                      ticket_sequence, created_at, updated_at
            "#,
        )
        .bind(event.id)
        .bind(event.title)
        .bind(event.sale_starts_at)
        .bind(event.sale_ends_at)
        .bind(event.event_starts_at)
        .bind(event.is_visible)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
