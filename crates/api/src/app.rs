use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use domain::services::{NotificationService, PaymentProvider, PaymentProviderError};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, security_headers_middleware, trace_id,
};
use crate::routes::{admin, events, health, payments, subscriptions, tickets};
use crate::services::email::{EmailError, EmailService};
use crate::services::notifications::NotificationDispatcher;
use crate::services::stripe::StripeClient;
use crate::services::telegram::{TelegramClient, TelegramError};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    /// Verifies access tokens.
    pub jwt: Arc<JwtConfig>,
    pub payments: Arc<dyn PaymentProvider>,
    pub notifier: Arc<dyn NotificationService>,
}

/// Failures while wiring collaborators at startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("JWT configuration: {0}")]
    Jwt(#[from] JwtError),

    #[error("Payment processor client: {0}")]
    Payments(#[from] PaymentProviderError),

    #[error("Email service: {0}")]
    Email(#[from] EmailError),

    #[error("Telegram client: {0}")]
    Telegram(#[from] TelegramError),
}

impl AppState {
    /// Production wiring: Stripe, e-mail and optional Telegram delivery.
    pub fn from_config(config: Config, pool: PgPool) -> Result<Self, StartupError> {
        let jwt = JwtConfig::verifier(&config.jwt.public_key, config.jwt.leeway_secs)?;
        let payments = StripeClient::new(&config.payments)?;
        let email = EmailService::new(config.email.clone())?;
        let telegram = if config.telegram.enabled {
            Some(TelegramClient::new(config.telegram.clone())?)
        } else {
            None
        };
        let notifier = NotificationDispatcher::new(email, telegram);

        Ok(Self::with_services(
            config,
            pool,
            jwt,
            Arc::new(payments),
            Arc::new(notifier),
        ))
    }

    /// Wiring with explicit collaborators.
    pub fn with_services(
        config: Config,
        pool: PgPool,
        jwt: JwtConfig,
        payments: Arc<dyn PaymentProvider>,
        notifier: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            payments,
            notifier,
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    // Authentication happens in the extractors of each handler.
    let api_routes = Router::new()
        .route("/api/v1/payments/webhook", post(payments::webhook))
        .route("/api/v1/events", get(events::list_events))
        .route("/api/v1/events/:event_id", get(events::get_event))
        .route(
            "/api/v1/events/:event_id/subscriptions/:topic",
            post(subscriptions::subscribe).delete(subscriptions::unsubscribe),
        )
        .route("/api/v1/me/tickets", get(tickets::list_my_tickets))
        .route("/api/v1/tickets/:ticket_id", get(tickets::get_ticket))
        .route(
            "/api/v1/tickets/:ticket_id/checklist/answers",
            post(tickets::submit_answer),
        )
        .route("/api/v1/admin/tickets/:ticket_id", delete(admin::revoke_ticket))
        .route(
            "/api/v1/admin/events/:event_id/tickets",
            post(admin::grant_ticket),
        )
        .route(
            "/api/v1/admin/events/:event_id/announce-sale",
            post(admin::announce_sale),
        );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Bottom layers run first
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
