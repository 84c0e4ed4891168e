//! Background job scheduler and job implementations.

mod inventory_gauges;
mod scheduler;
mod session_cleanup;

pub use inventory_gauges::InventoryGaugesJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
pub use session_cleanup::SessionCleanupJob;
