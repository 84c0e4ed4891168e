use std::time::Duration;

use anyhow::Result;
use tracing::info;

use events_api::app::{create_app, AppState};
use events_api::config::Config;
use events_api::jobs::{InventoryGaugesJob, JobScheduler, SessionCleanupJob};
use events_api::middleware::{init_metrics, logging::init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    init_logging(&config.logging).map_err(|e| anyhow::anyhow!("logging: {}", e))?;
    init_metrics()?;

    info!("Starting Events API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&config.database.pool_config()).await?;

    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    let mut scheduler = JobScheduler::new();
    scheduler.register(InventoryGaugesJob::new(pool.clone(), None));
    scheduler.register(SessionCleanupJob::new(pool.clone(), None));
    scheduler.start();

    let addr = config.socket_addr()?;
    let state = AppState::from_config(config, pool)?;
    let app = create_app(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown(Duration::from_secs(10)).await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
