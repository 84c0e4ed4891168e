//! Ticket repository for read operations.
//!
//! Tickets are created and deleted only through [`crate::repositories::TicketIssuer`].

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{HeldTicketEntity, TicketEntity};
use crate::metrics::QueryTimer;

/// Repository for ticket database queries.
#[derive(Clone)]
pub struct TicketRepository {
    pool: PgPool,
}

impl TicketRepository {
    /// Creates a new TicketRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a ticket by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<TicketEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_ticket_by_id");
        let result = sqlx::query_as::<_, TicketEntity>(
            r#"
            SELECT id, code, user_id, customer_email, payment_id, event_id,
                   ticket_type_id, metadata, session, created_at
            FROM tickets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// All tickets of an event ordered by code.
    pub async fn find_by_event(&self, event_id: &str) -> Result<Vec<TicketEntity>, sqlx::Error> {
        sqlx::query_as::<_, TicketEntity>(
            r#"
            SELECT id, code, user_id, customer_email, payment_id, event_id,
                   ticket_type_id, metadata, session, created_at
            FROM tickets
            WHERE event_id = $1
            ORDER BY code ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Tickets paid with a given payment id.
    pub async fn find_by_payment_id(
        &self,
        payment_id: &str,
    ) -> Result<Vec<TicketEntity>, sqlx::Error> {
        sqlx::query_as::<_, TicketEntity>(
            r#"
            SELECT id, code, user_id, customer_email, payment_id, event_id,
                   ticket_type_id, metadata, session, created_at
            FROM tickets
            WHERE payment_id = $1
            ORDER BY code ASC
            "#,
        )
        .bind(payment_id)
        .fetch_all(&self.pool)
        .await
    }

    /// A user's tickets for one event ordered by code.
    pub async fn find_by_event_and_user(
        &self,
        event_id: &str,
        user_id: Uuid,
    ) -> Result<Vec<TicketEntity>, sqlx::Error> {
        sqlx::query_as::<_, TicketEntity>(
            r#"
            SELECT id, code, user_id, customer_email, payment_id, event_id,
                   ticket_type_id, metadata, session, created_at
            FROM tickets
            WHERE event_id = $1 AND user_id = $2
            ORDER BY code ASC
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Every ticket a user holds, newest first.
    pub async fn find_held_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<HeldTicketEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_held_tickets");
        let result = sqlx::query_as::<_, HeldTicketEntity>(
            r#"
            SELECT t.id, t.code, t.user_id, t.customer_email, t.payment_id, t.event_id,
                   t.ticket_type_id, t.metadata, t.session, t.created_at,
                   e.title AS event_title, e.event_starts_at,
                   tt.name AS ticket_type_name
            FROM tickets t
            JOIN events e ON e.id = t.event_id
            JOIN ticket_types tt ON tt.id = t.ticket_type_id
            WHERE t.user_id = $1
            ORDER BY t.created_at DESC, t.code DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Whether a user already holds any ticket for an event.
    pub async fn user_has_ticket_for_event(
        &self,
        user_id: Uuid,
        event_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM tickets WHERE user_id = $1 AND event_id = $2)",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists.0)
    }
}
