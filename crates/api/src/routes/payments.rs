//! Payment processor webhook endpoint.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use shared::signature::SIGNATURE_HEADER;

use crate::app::AppState;
use crate::services::reconciler::WebhookReconciler;

/// Handles `checkout.session.completed` deliveries.
///
/// The body is taken raw; the signature covers the exact bytes.
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let reconciler = WebhookReconciler::new(
        state.pool.clone(),
        state.payments.clone(),
        state.notifier.clone(),
        &state.config.payments,
    );

    match reconciler.handle(&body, signature).await {
        Ok(outcome) => outcome.into_response(),
        Err(e) => e.into_response(),
    }
}
