//! Samples inventory state and connection pool usage into gauges.
//!
//! Counters only see transitions, so a restarted process would report no
//! sold-out types until the next sale. The gauges are re-read from the
//! database instead.

use persistence::metrics::{record_inventory_gauges, record_pool_metrics};
use persistence::repositories::TicketTypeRepository;
use sqlx::PgPool;
use tracing::debug;

use super::scheduler::{Job, JobFrequency};

pub const DEFAULT_INTERVAL_SECS: u64 = 30;

pub struct InventoryGaugesJob {
    pool: PgPool,
    interval_secs: u64,
}

impl InventoryGaugesJob {
    pub fn new(pool: PgPool, interval_secs: Option<u64>) -> Self {
        Self {
            pool,
            interval_secs: interval_secs.filter(|s| *s > 0).unwrap_or(DEFAULT_INTERVAL_SECS),
        }
    }
}

#[async_trait::async_trait]
impl Job for InventoryGaugesJob {
    fn name(&self) -> &'static str {
        "inventory_gauges"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(self.interval_secs)
    }

    async fn execute(&self) -> Result<(), String> {
        record_pool_metrics(&self.pool);

        let snapshot = TicketTypeRepository::new(self.pool.clone())
            .inventory_snapshot()
            .await
            .map_err(|e| format!("Failed to sample inventory: {}", e))?;
        record_inventory_gauges(&snapshot);

        debug!(
            open_types = snapshot.open_types(),
            sold_out_types = snapshot.sold_out_types,
            sold_out_events = snapshot.sold_out_events,
            "Sampled inventory"
        );
        Ok(())
    }
}
