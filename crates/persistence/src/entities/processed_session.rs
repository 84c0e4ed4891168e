//! Processed payment session entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the processed_payment_sessions table.
#[derive(Debug, Clone, FromRow)]
pub struct ProcessedSessionEntity {
    pub session_id: String,
    pub event_id: String,
    pub tickets_issued: i32,
    pub response_body: String,
    pub created_at: DateTime<Utc>,
}
