//! Idempotency records for payment sessions turned into tickets.

use sqlx::{PgPool, Postgres, Transaction};

use crate::entities::ProcessedSessionEntity;

/// Repository for processed payment sessions.
#[derive(Clone)]
pub struct ProcessedSessionRepository {
    pool: PgPool,
}

impl ProcessedSessionRepository {
    /// Creates a new ProcessedSessionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the record for a session, if it was already processed.
    pub async fn find(
        &self,
        session_id: &str,
    ) -> Result<Option<ProcessedSessionEntity>, sqlx::Error> {
        sqlx::query_as::<_, ProcessedSessionEntity>(
            r#"
            SELECT session_id, event_id, tickets_issued, response_body, created_at
            FROM processed_payment_sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Claims a session inside the issuance transaction.
    ///
    /// Returns `false` when another delivery already claimed it. A concurrent
    /// claimer blocks on the primary key until the first one finishes.
    pub async fn claim_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        session_id: &str,
        webhook_event_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO processed_payment_sessions (session_id, event_id)
            VALUES ($1, $2)
            ON CONFLICT (session_id) DO NOTHING
            "#,
        )
        .bind(session_id)
        .bind(webhook_event_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Stores the final outcome of a claimed session.
    pub async fn complete_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        session_id: &str,
        tickets_issued: i32,
        response_body: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE processed_payment_sessions
            SET tickets_issued = $2, response_body = $3
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .bind(tickets_issued)
        .bind(response_body)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Drops records older than the retention window. Returns rows deleted.
    pub async fn delete_older_than(&self, retention_days: i32) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM processed_payment_sessions
            WHERE created_at < NOW() - make_interval(days => $1)
            "#,
        )
        .bind(retention_days)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
