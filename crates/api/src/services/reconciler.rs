//! Payment webhook reconciliation.
//!
//! Turns a verified `checkout.session.completed` delivery into tickets:
//! re-fetch the session, map line items to ticket types, resolve the
//! purchaser, then issue every unit in one transaction that also claims the
//! session id. Payment link deactivation and confirmations run after commit.

use std::collections::HashSet;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use domain::models::{CheckoutSession, LineItem, PaymentEvent, TicketMetadata, TicketType, User};
use domain::services::{
    purchaser_lookup, ticket_email, NotificationRequest, NotificationService, PaymentProvider,
    PaymentProviderError, PurchaserError, PurchaserLookup, PurchaserResolution,
};
use persistence::entities::TicketTypeEntity;
use persistence::repositories::{
    IssueError, IssueRequest, IssuedTicket, ProcessedSessionRepository, TicketIssuer,
    TicketTypeRepository, UserRepository,
};
use shared::signature::{verify_signature, SignatureError};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::config::PaymentsConfig;
use crate::middleware::metrics::{record_tickets_issued, record_webhook_event};

/// Body returned for every successful or already-handled delivery.
pub const OK_BODY: &str = "[ok]";

/// A webhook that was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Processed {
        session_id: String,
        tickets_issued: usize,
    },
    AlreadyProcessed {
        session_id: String,
    },
    /// Not an event type this service acts on.
    Ignored {
        event_type: String,
    },
}

impl IntoResponse for WebhookOutcome {
    fn into_response(self) -> Response {
        match self {
            WebhookOutcome::Processed { .. } | WebhookOutcome::AlreadyProcessed { .. } => {
                (StatusCode::OK, OK_BODY).into_response()
            }
            WebhookOutcome::Ignored { .. } => {
                (StatusCode::BAD_REQUEST, "[unknown event]").into_response()
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("No ticket type for price {price_id} (product {product_id:?})")]
    UnknownPrice {
        price_id: String,
        product_id: Option<String>,
    },

    #[error("Cannot identify purchaser: {0}")]
    Purchaser(#[from] PurchaserError),

    #[error("Payment processor error: {0}")]
    Provider(#[from] PaymentProviderError),

    #[error("Cannot issue tickets: {0}")]
    Issue(IssueError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<IssueError> for WebhookError {
    fn from(err: IssueError) -> Self {
        match err {
            IssueError::Database(e) => WebhookError::Database(e),
            other => WebhookError::Issue(other),
        }
    }
}

impl WebhookError {
    fn outcome_label(&self) -> &'static str {
        match self {
            WebhookError::InvalidSignature(_) => "invalid_signature",
            WebhookError::InvalidPayload(_) => "invalid_payload",
            WebhookError::UnknownPrice { .. } => "unknown_price",
            WebhookError::Purchaser(_) => "unknown_purchaser",
            WebhookError::Provider(_) => "provider_error",
            WebhookError::Issue(e) if e.is_capacity() => "capacity",
            WebhookError::Issue(_) => "unknown_ticket_type",
            WebhookError::Database(_) => "database_error",
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            WebhookError::InvalidSignature(_) => (StatusCode::BAD_REQUEST, "[invalid signature]"),
            WebhookError::InvalidPayload(_) => (StatusCode::BAD_REQUEST, "[invalid payload]"),
            WebhookError::UnknownPrice { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "[unknown price]")
            }
            WebhookError::Purchaser(_) => (StatusCode::UNPROCESSABLE_ENTITY, "[unknown purchaser]"),
            WebhookError::Issue(e) if e.is_capacity() => (StatusCode::CONFLICT, "[sold out]"),
            WebhookError::Issue(_) => (StatusCode::UNPROCESSABLE_ENTITY, "[unknown ticket type]"),
            WebhookError::Provider(_) => (StatusCode::INTERNAL_SERVER_ERROR, "[processor error]"),
            WebhookError::Database(e) => {
                tracing::error!(
                    error = %e,
                    retryable = persistence::db::is_retryable(e),
                    "Webhook failed on storage"
                );
                (StatusCode::INTERNAL_SERVER_ERROR, "[internal error]")
            }
        };
        (status, body).into_response()
    }
}

/// A line item mapped to its ticket type.
#[derive(Debug, Clone)]
struct PlannedItem {
    ticket_type: TicketTypeEntity,
    line_item: LineItem,
}

/// Sorts by (event, ticket type) so concurrent sessions lock rows in the
/// same order.
fn sort_for_issuance(plan: &mut [PlannedItem]) {
    plan.sort_by(|a, b| {
        (&a.ticket_type.event_id, a.ticket_type.id)
            .cmp(&(&b.ticket_type.event_id, b.ticket_type.id))
    });
}

/// Who receives the tickets of a session.
#[derive(Debug, Clone)]
struct Purchaser {
    user: Option<User>,
    email: String,
}

/// Handles payment-completion webhooks.
pub struct WebhookReconciler {
    pool: PgPool,
    payments: Arc<dyn PaymentProvider>,
    notifier: Arc<dyn NotificationService>,
    webhook_secret: String,
    tolerance_secs: i64,
    resolution: PurchaserResolution,
}

impl WebhookReconciler {
    pub fn new(
        pool: PgPool,
        payments: Arc<dyn PaymentProvider>,
        notifier: Arc<dyn NotificationService>,
        config: &PaymentsConfig,
    ) -> Self {
        Self {
            pool,
            payments,
            notifier,
            webhook_secret: config.webhook_secret.clone(),
            tolerance_secs: config.signature_tolerance_secs,
            resolution: config.resolution(),
        }
    }

    /// Verifies, parses and processes one delivery, recording its outcome.
    pub async fn handle(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, WebhookError> {
        let result = self.process(payload, signature).await;
        match &result {
            Ok(WebhookOutcome::Processed { .. }) => record_webhook_event("processed"),
            Ok(WebhookOutcome::AlreadyProcessed { .. }) => record_webhook_event("duplicate"),
            Ok(WebhookOutcome::Ignored { .. }) => record_webhook_event("ignored"),
            Err(e) => record_webhook_event(e.outcome_label()),
        }
        result
    }

    async fn process(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, WebhookError> {
        if let Err(e) = verify_signature(
            payload,
            signature,
            &self.webhook_secret,
            self.tolerance_secs,
            Utc::now().timestamp(),
        ) {
            tracing::warn!(error = %e, "Webhook signature verification failed");
            return Err(e.into());
        }

        let event = PaymentEvent::parse(payload).map_err(|e| {
            tracing::warn!(error = %e, "Webhook payload could not be parsed");
            WebhookError::InvalidPayload(e.to_string())
        })?;

        let (webhook_event_id, session_id, snapshot) = match event {
            PaymentEvent::CheckoutCompleted {
                event_id,
                session_id,
                snapshot,
            } => (event_id, session_id, snapshot),
            PaymentEvent::Unhandled {
                event_id,
                event_type,
            } => {
                tracing::debug!(event_id = %event_id, event_type = %event_type, "Ignoring webhook");
                return Ok(WebhookOutcome::Ignored { event_type });
            }
        };

        let processed = ProcessedSessionRepository::new(self.pool.clone());
        if processed.find(&session_id).await?.is_some() {
            tracing::info!(session_id = %session_id, "Session already processed");
            return Ok(WebhookOutcome::AlreadyProcessed { session_id });
        }

        let session = self
            .payments
            .retrieve_checkout_session(&session_id)
            .await
            .map_err(|e| {
                tracing::warn!(
                    session_id = %session_id,
                    retryable = e.is_retryable(),
                    error = %e,
                    "Failed to retrieve checkout session"
                );
                WebhookError::Provider(e)
            })?;

        let mut plan = self.map_line_items(&session).await?;
        sort_for_issuance(&mut plan);

        let purchaser = self.resolve_purchaser(&session).await?;

        let mut tx = self.pool.begin().await?;
        if !ProcessedSessionRepository::claim_in_tx(&mut tx, &session_id, &webhook_event_id)
            .await?
        {
            tx.rollback().await?;
            tracing::info!(session_id = %session_id, "Session claimed by a concurrent delivery");
            return Ok(WebhookOutcome::AlreadyProcessed { session_id });
        }

        let requested = session.total_quantity();
        let mut issued: Vec<IssuedTicket> =
            Vec::with_capacity(usize::try_from(requested).unwrap_or_default());
        for item in &plan {
            let request = IssueRequest {
                event_id: item.ticket_type.event_id.clone(),
                ticket_type_id: item.ticket_type.id,
                user_id: purchaser.user.as_ref().map(|u| u.id),
                customer_email: Some(purchaser.email.clone()),
                payment_id: Some(
                    session
                        .payment_intent
                        .clone()
                        .unwrap_or_else(|| session.id.clone()),
                ),
                metadata: TicketMetadata::purchase(
                    item.line_item.unit_amount,
                    &item.line_item.currency,
                    session.created,
                )
                .to_json(),
                session: snapshot.clone(),
                enforce_per_user_limit: false,
            };

            for _ in 0..item.line_item.quantity.max(0) {
                match TicketIssuer::issue_in_tx(&mut tx, &request).await {
                    Ok(ticket) => issued.push(ticket),
                    Err(e) => {
                        tracing::error!(
                            session_id = %session_id,
                            ticket_type_id = %item.ticket_type.id,
                            error = %e,
                            "Paid session could not be issued"
                        );
                        return Err(e.into());
                    }
                }
            }
        }

        ProcessedSessionRepository::complete_in_tx(&mut tx, &session_id, issued.len() as i32, OK_BODY)
            .await?;
        tx.commit().await?;

        record_tickets_issued("webhook", issued.len());
        tracing::info!(
            session_id = %session_id,
            tickets_requested = requested,
            tickets_issued = issued.len(),
            "Checkout session reconciled"
        );

        self.deactivate_sold_out_links(&issued).await;
        self.send_confirmations(&issued, &purchaser).await;

        Ok(WebhookOutcome::Processed {
            session_id,
            tickets_issued: issued.len(),
        })
    }

    async fn map_line_items(
        &self,
        session: &CheckoutSession,
    ) -> Result<Vec<PlannedItem>, WebhookError> {
        let ticket_types = TicketTypeRepository::new(self.pool.clone());
        let mut plan = Vec::with_capacity(session.line_items.len());

        for line_item in session.line_items.iter().filter(|i| i.quantity > 0) {
            let ticket_type = ticket_types
                .find_by_stripe_ids(&line_item.price_id, line_item.product_id.as_deref())
                .await?
                .ok_or_else(|| {
                    tracing::error!(
                        session_id = %session.id,
                        price_id = %line_item.price_id,
                        product_id = ?line_item.product_id,
                        "No ticket type mapped to purchased price"
                    );
                    WebhookError::UnknownPrice {
                        price_id: line_item.price_id.clone(),
                        product_id: line_item.product_id.clone(),
                    }
                })?;
            plan.push(PlannedItem {
                ticket_type,
                line_item: line_item.clone(),
            });
        }
        Ok(plan)
    }

    async fn resolve_purchaser(&self, session: &CheckoutSession) -> Result<Purchaser, WebhookError> {
        let users = UserRepository::new(self.pool.clone());
        let lookup = purchaser_lookup(self.resolution, session)?;

        let user = match &lookup {
            PurchaserLookup::Member { id, slug } => {
                let by_id = match id {
                    Some(id) => users.find_by_id(*id).await?,
                    None => None,
                };
                match (by_id, slug) {
                    (Some(user), _) => Some(user),
                    (None, Some(slug)) => users.find_by_slug(slug).await?,
                    (None, None) => None,
                }
            }
            PurchaserLookup::ByEmail(email) => users.find_by_email(email).await?,
            PurchaserLookup::Guest => None,
        };
        if user.is_none() && lookup != PurchaserLookup::Guest {
            tracing::warn!(
                session_id = %session.id,
                lookup = ?lookup,
                "Purchaser not found, issuing as guest"
            );
        }

        let user: Option<User> = user.map(Into::into);
        let email = ticket_email(user.as_ref(), session)?;
        Ok(Purchaser { user, email })
    }

    async fn deactivate_sold_out_links(&self, issued: &[IssuedTicket]) {
        let mut seen: HashSet<Uuid> = HashSet::new();
        for ticket in issued.iter().filter(|t| t.became_sold_out()) {
            if !seen.insert(ticket.ticket_type.id) {
                continue;
            }
            let Some(link_id) = ticket.ticket_type.stripe_payment_link_id.as_deref() else {
                continue;
            };
            if let Err(e) = self.payments.deactivate_payment_link(link_id).await {
                tracing::warn!(
                    ticket_type_id = %ticket.ticket_type.id,
                    link_id = %link_id,
                    error = %e,
                    "Failed to deactivate payment link of sold out ticket type"
                );
            }
        }
    }

    /// One confirmation per distinct ticket type.
    async fn send_confirmations(&self, issued: &[IssuedTicket], purchaser: &Purchaser) {
        let chat_id = purchaser.user.as_ref().and_then(|u| u.telegram_id.clone());
        let mut seen: HashSet<Uuid> = HashSet::new();

        for ticket in issued {
            if !seen.insert(ticket.ticket_type.id) {
                continue;
            }
            let ticket_type: TicketType = ticket.ticket_type.clone().into();
            let request = NotificationRequest::purchase_confirmation(
                &ticket_type,
                Some(purchaser.email.clone()),
                chat_id.clone(),
            );
            let report = self.notifier.notify(request).await;
            if report.failures() > 0 {
                tracing::warn!(
                    ticket_type_id = %ticket_type.id,
                    failures = report.failures(),
                    "Purchase confirmation partially failed"
                );
            }
        }
    }
}
