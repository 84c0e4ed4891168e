//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: DatabaseHealth,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Simple status response for liveness and readiness checks.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

impl HealthResponse {
    fn from_check(connected: bool, latency_ms: u64) -> Self {
        Self {
            status: if connected { "healthy" } else { "unhealthy" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: DatabaseHealth {
                connected,
                latency_ms: connected.then_some(latency_ms),
            },
        }
    }
}

/// Full health check with database round-trip latency.
pub async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let start = std::time::Instant::now();
    let connected = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    let response = HealthResponse::from_check(connected, start.elapsed().as_millis() as u64);

    let status = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Liveness: the process is running.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness: the database answers.
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    if sqlx::query("SELECT 1").execute(&state.pool).await.is_ok() {
        Ok(Json(StatusResponse {
            status: "ready".to_string(),
        }))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
