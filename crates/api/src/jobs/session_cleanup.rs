//! Prunes old idempotency records of processed payment sessions.

use persistence::repositories::ProcessedSessionRepository;
use sqlx::PgPool;
use tracing::info;

use super::scheduler::{Job, JobFrequency};

/// Far beyond the processor's redelivery window.
pub const DEFAULT_RETENTION_DAYS: i32 = 90;

pub struct SessionCleanupJob {
    pool: PgPool,
    retention_days: i32,
}

impl SessionCleanupJob {
    pub fn new(pool: PgPool, retention_days: Option<i32>) -> Self {
        Self {
            pool,
            retention_days: retention_days.unwrap_or(DEFAULT_RETENTION_DAYS),
        }
    }
}

#[async_trait::async_trait]
impl Job for SessionCleanupJob {
    fn name(&self) -> &'static str {
        "session_cleanup"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Daily
    }

    async fn execute(&self) -> Result<(), String> {
        let deleted = ProcessedSessionRepository::new(self.pool.clone())
            .delete_older_than(self.retention_days)
            .await
            .map_err(|e| format!("Failed to prune processed sessions: {}", e))?;

        info!(
            deleted,
            retention_days = self.retention_days,
            "Pruned processed payment sessions"
        );
        Ok(())
    }
}
