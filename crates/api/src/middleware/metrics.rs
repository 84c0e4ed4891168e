//! Prometheus metrics middleware and business counters.

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Records `http_requests_total` and `http_request_duration_seconds`,
/// labelled by the matched route rather than the raw path.
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = method_to_str(req.method());
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    counter!(
        "http_requests_total",
        "method" => method,
        "path" => path.clone(),
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path
    )
    .record(start.elapsed().as_secs_f64());

    response
}

fn method_to_str(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        Method::PATCH => "PATCH",
        _ => "OTHER",
    }
}

/// Count tickets issued, by path (`webhook`, `sync`).
pub fn record_tickets_issued(source: &'static str, count: usize) {
    counter!("tickets_issued_total", "source" => source).increment(count as u64);
}

/// Count a webhook delivery by outcome label.
pub fn record_webhook_event(outcome: &'static str) {
    counter!("webhook_events_total", "outcome" => outcome).increment(1);
}

/// Count a refused checklist answer for a full option.
pub fn record_checklist_capacity_rejection() {
    counter!("checklist_capacity_rejections_total").increment(1);
}

/// Count notification deliveries by channel and result.
pub fn record_notification(channel: &'static str, delivered: bool) {
    let result = if delivered { "sent" } else { "failed" };
    counter!("notifications_total", "channel" => channel, "result" => result).increment(1);
}

/// Handler for `/metrics` in Prometheus text format.
pub async fn metrics_handler() -> impl IntoResponse {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(axum::http::header::CONTENT_TYPE, "text/plain")],
            "Metrics not initialized".to_string(),
        ),
    }
}

/// Installs the global Prometheus recorder. Calling it again is a no-op.
pub fn init_metrics() -> Result<(), BuildError> {
    if PROMETHEUS_HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .set_buckets(&[0.001, 0.005, 0.01, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0])?
        .install_recorder()?;
    let _ = PROMETHEUS_HANDLE.set(handle);
    Ok(())
}
