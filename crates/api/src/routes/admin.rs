//! Admin operations API routes.
//!
//! Requires a signed-in member holding the admin role.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{
    AnnouncementRecipient, Event, SubscriptionTopic, Ticket, TicketMetadata, TicketResponse,
};
use domain::services::NotificationRequest;
use persistence::entities::UserEntity;
use persistence::repositories::{
    EventRepository, IssueRequest, SubscriptionRepository, TicketIssuer, UserRepository,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminAuth;
use crate::middleware::metrics::record_tickets_issued;

const GRANT_SOURCE: &str = "admin_grant";

/// Ticket to hand out without payment.
#[derive(Debug, Deserialize)]
pub struct GrantTicketRequest {
    pub ticket_type_id: Uuid,
    pub user_id: Uuid,
}

/// Ledger state of the ticket's type after a revocation.
#[derive(Debug, Serialize)]
pub struct RevokeTicketResponse {
    pub ticket_id: Uuid,
    pub ticket_type_id: Uuid,
    pub tickets_sold: i32,
    pub is_sold_out: bool,
}

/// Tallies of a sale announcement run.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct AnnouncementResponse {
    pub recipients: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Revoke a ticket and recount its type.
///
/// DELETE /api/v1/admin/tickets/:ticket_id
pub async fn revoke_ticket(
    State(state): State<AppState>,
    admin: AdminAuth,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<RevokeTicketResponse>, ApiError> {
    let ledger = TicketIssuer::new(state.pool.clone())
        .revoke(ticket_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Ticket {} not found", ticket_id)))?;

    info!(
        admin_id = %admin.user.id,
        ticket_id = %ticket_id,
        ticket_type_id = %ledger.ticket_type_id,
        tickets_sold = ledger.tickets_sold,
        "Ticket revoked"
    );

    Ok(Json(RevokeTicketResponse {
        ticket_id,
        ticket_type_id: ledger.ticket_type_id,
        tickets_sold: ledger.tickets_sold,
        is_sold_out: ledger.type_sold_out,
    }))
}

fn grant_request(event_id: String, ticket_type_id: Uuid, user: &UserEntity) -> IssueRequest {
    IssueRequest {
        event_id,
        ticket_type_id,
        user_id: Some(user.id),
        customer_email: Some(user.email.clone()),
        payment_id: None,
        metadata: TicketMetadata::granted_by(GRANT_SOURCE).to_json(),
        session: serde_json::json!({}),
        enforce_per_user_limit: true,
    }
}

/// Grant a member a ticket without payment.
///
/// Goes through the same issuer as purchases, with the type's per-user limit
/// applied.
///
/// POST /api/v1/admin/events/:event_id/tickets
pub async fn grant_ticket(
    State(state): State<AppState>,
    admin: AdminAuth,
    Path(event_id): Path<String>,
    Json(request): Json<GrantTicketRequest>,
) -> Result<(StatusCode, Json<TicketResponse>), ApiError> {
    let user = UserRepository::new(state.pool.clone())
        .find_by_id(request.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", request.user_id)))?;

    let issued = TicketIssuer::new(state.pool.clone())
        .issue(&grant_request(event_id, request.ticket_type_id, &user))
        .await?;
    record_tickets_issued("admin", 1);

    if issued.became_sold_out() {
        if let Some(link_id) = issued.ticket_type.stripe_payment_link_id.as_deref() {
            if let Err(e) = state.payments.deactivate_payment_link(link_id).await {
                warn!(
                    ticket_type_id = %issued.ticket_type.id,
                    link_id = %link_id,
                    error = %e,
                    "Failed to deactivate payment link of sold out ticket type"
                );
            }
        }
    }

    info!(
        admin_id = %admin.user.id,
        user_id = %user.id,
        ticket_id = %issued.ticket.id,
        event_id = %issued.ticket.event_id,
        code = issued.ticket.code,
        "Ticket granted"
    );

    let ticket: Ticket = issued.ticket.into();
    Ok((StatusCode::CREATED, Json(ticket.into())))
}

fn announcement_for(event: &Event, recipient: AnnouncementRecipient) -> NotificationRequest {
    NotificationRequest::sale_announcement(
        &event.title,
        Some(recipient.email),
        recipient.telegram_id,
    )
}

/// Notify everyone subscribed to an event's sale announcements.
///
/// POST /api/v1/admin/events/:event_id/announce-sale
pub async fn announce_sale(
    State(state): State<AppState>,
    admin: AdminAuth,
    Path(event_id): Path<String>,
) -> Result<Json<AnnouncementResponse>, ApiError> {
    let event: Event = EventRepository::new(state.pool.clone())
        .find_by_id(&event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Event {} not found", event_id)))?
        .into();

    let recipients = SubscriptionRepository::new(state.pool.clone())
        .find_recipients(&event.id, &[SubscriptionTopic::All, SubscriptionTopic::Sale])
        .await?;

    let mut response = AnnouncementResponse {
        recipients: recipients.len(),
        ..Default::default()
    };

    for recipient in recipients {
        let report = state
            .notifier
            .notify(announcement_for(&event, recipient.into()))
            .await;
        if report.any_sent() {
            response.delivered += 1;
        } else {
            response.failed += 1;
        }
    }

    if response.failed > 0 {
        warn!(
            event_id = %event.id,
            failed = response.failed,
            "Some sale announcements were not delivered"
        );
    }
    info!(
        admin_id = %admin.user.id,
        event_id = %event.id,
        recipients = response.recipients,
        delivered = response.delivered,
        "Sale announced"
    );

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event() -> Event {
        let now = Utc::now();
        Event {
            id: "camp".into(),
            title: "Summer Camp".into(),
            description: None,
            location: None,
            sale_starts_at: Some(now),
            sale_ends_at: None,
            event_starts_at: None,
            event_ends_at: None,
            is_visible: true,
            is_sold_out: false,
            ticket_sequence: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_announcement_targets_both_channels() {
        let request = announcement_for(
            &event(),
            AnnouncementRecipient {
                email: "a@b.c".into(),
                telegram_id: Some("42".into()),
            },
        );
        assert_eq!(request.email.as_deref(), Some("a@b.c"));
        assert_eq!(request.chat_id.as_deref(), Some("42"));
        assert!(request.title.contains("Summer Camp"));
    }

    #[test]
    fn test_grant_request_enforces_per_user_limit() {
        let now = Utc::now();
        let user = UserEntity {
            id: Uuid::new_v4(),
            slug: "member".into(),
            email: "member@example.com".into(),
            full_name: None,
            avatar: None,
            telegram_id: None,
            roles: vec![],
            created_at: now,
            updated_at: now,
        };
        let request = grant_request("camp".into(), Uuid::new_v4(), &user);
        assert!(request.enforce_per_user_limit);
        assert_eq!(request.user_id, Some(user.id));
        assert_eq!(request.customer_email.as_deref(), Some("member@example.com"));
        assert_eq!(request.payment_id, None);
        assert_eq!(request.metadata["source"], GRANT_SOURCE);
    }

    #[test]
    fn test_announcement_response_serializes() {
        let json = serde_json::to_value(AnnouncementResponse {
            recipients: 3,
            delivered: 2,
            failed: 1,
        })
        .unwrap();
        assert_eq!(json["recipients"], 3);
        assert_eq!(json["failed"], 1);
    }
}
