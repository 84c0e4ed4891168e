//! Database and inventory metrics.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

use crate::repositories::InventorySnapshot;

/// Record database query duration.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Record database connection pool metrics.
///
/// Called periodically by the inventory gauges job.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Publish a sampled inventory snapshot.
pub fn record_inventory_gauges(snapshot: &InventorySnapshot) {
    gauge!("inventory_ticket_types_open").set(snapshot.open_types() as f64);
    gauge!("inventory_ticket_types_sold_out").set(snapshot.sold_out_types as f64);
    gauge!("inventory_events_sold_out").set(snapshot.sold_out_events as f64);
}

/// Count a ticket type or event crossing into sold-out.
pub fn record_sold_out(scope: &'static str) {
    counter!("inventory_sold_out_total", "scope" => scope).increment(1);
}

/// Times a database operation and records it under `query_name`.
///
/// ```ignore
/// let timer = QueryTimer::new("find_ticket_by_id");
/// let result = sqlx::query_as::<_, TicketEntity>(...).fetch_optional(&pool).await;
/// timer.record();
/// result
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration to metrics.
    pub fn record(self) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_creation() {
        let timer = QueryTimer::new("issue_ticket");
        assert_eq!(timer.query_name, "issue_ticket");
        timer.record();
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        record_sold_out("event");
        record_query_duration("noop", 0.01);
    }
}
