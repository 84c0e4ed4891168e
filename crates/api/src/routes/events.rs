//! Public event listing and event view.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use domain::models::{
    Event, EventSubscription, ParticipantResponse, SubscriptionTopic, Ticket, TicketResponse,
    TicketType, TicketTypeResponse, User,
};
use persistence::repositories::{
    EventRepository, SubscriptionRepository, TicketRepository, TicketTypeRepository,
    UserRepository,
};
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub sale_starts_at: Option<DateTime<Utc>>,
    pub sale_ends_at: Option<DateTime<Utc>>,
    pub event_starts_at: Option<DateTime<Utc>>,
    pub event_ends_at: Option<DateTime<Utc>>,
    pub is_sold_out: bool,
    pub is_sale_active: bool,
    pub is_sale_starts_soon: bool,
    pub seconds_until_sale: i64,
    pub ticket_types: Vec<TicketTypeResponse>,
    /// Filled for signed-in callers only.
    pub participants: Vec<ParticipantResponse>,
    pub my_tickets: Vec<TicketResponse>,
    pub my_notifications: Vec<SubscriptionTopic>,
}

impl EventResponse {
    pub fn build(event: Event, ticket_types: Vec<TicketType>, now: DateTime<Utc>) -> Self {
        Self {
            is_sale_active: event.is_sale_active(now),
            is_sale_starts_soon: event.is_sale_starts_soon(now),
            seconds_until_sale: event.seconds_until_sale_starts(now),
            ticket_types: ticket_types
                .into_iter()
                .filter(|t| t.is_visible)
                .map(TicketTypeResponse::from)
                .collect(),
            id: event.id,
            title: event.title,
            description: event.description,
            location: event.location,
            sale_starts_at: event.sale_starts_at,
            sale_ends_at: event.sale_ends_at,
            event_starts_at: event.event_starts_at,
            event_ends_at: event.event_ends_at,
            is_sold_out: event.is_sold_out,
            participants: Vec::new(),
            my_tickets: Vec::new(),
            my_notifications: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventSummaryResponse {
    pub id: String,
    pub title: String,
    pub location: Option<String>,
    pub event_starts_at: Option<DateTime<Utc>>,
    pub event_ends_at: Option<DateTime<Utc>>,
    pub is_sold_out: bool,
    pub is_sale_active: bool,
}

impl EventSummaryResponse {
    fn build(event: Event, now: DateTime<Utc>) -> Self {
        Self {
            is_sale_active: event.is_sale_active(now),
            id: event.id,
            title: event.title,
            location: event.location,
            event_starts_at: event.event_starts_at,
            event_ends_at: event.event_ends_at,
            is_sold_out: event.is_sold_out,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventListResponse {
    /// Soonest first.
    pub upcoming: Vec<EventSummaryResponse>,
    /// Most recent first.
    pub past: Vec<EventSummaryResponse>,
}

impl EventListResponse {
    /// Splits scheduled events around `now`; unscheduled ones are left out.
    pub fn build(events: Vec<Event>, now: DateTime<Utc>) -> Self {
        let mut upcoming = Vec::new();
        let mut past = Vec::new();
        for event in events {
            match event.is_upcoming(now) {
                Some(true) => upcoming.push(EventSummaryResponse::build(event, now)),
                Some(false) => past.push(EventSummaryResponse::build(event, now)),
                None => {}
            }
        }
        upcoming.sort_by_key(|e| e.event_starts_at);
        past.sort_by_key(|e| std::cmp::Reverse(e.event_starts_at));
        Self { upcoming, past }
    }
}

/// List visible events split into upcoming and past.
///
/// GET /api/v1/events
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<EventListResponse>, ApiError> {
    let events = EventRepository::new(state.pool.clone())
        .find_visible_scheduled()
        .await?
        .into_iter()
        .map(Event::from)
        .collect();

    Ok(Json(EventListResponse::build(events, Utc::now())))
}

/// Get a visible event with its visible ticket types.
///
/// Signed-in callers also see who is going, their own tickets and the topics
/// they are subscribed to.
///
/// GET /api/v1/events/:event_id
pub async fn get_event(
    State(state): State<AppState>,
    auth: Option<UserAuth>,
    Path(event_id): Path<String>,
) -> Result<Json<EventResponse>, ApiError> {
    let event: Event = EventRepository::new(state.pool.clone())
        .find_by_id(&event_id)
        .await?
        .filter(|e| e.is_visible)
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?
        .into();

    let ticket_types = TicketTypeRepository::new(state.pool.clone())
        .find_by_event(&event.id)
        .await?
        .into_iter()
        .map(TicketType::from)
        .collect();

    let mut response = EventResponse::build(event, ticket_types, Utc::now());
    if let Some(auth) = auth {
        fill_member_view(&state, &auth, &mut response).await?;
    }
    Ok(Json(response))
}

async fn fill_member_view(
    state: &AppState,
    auth: &UserAuth,
    response: &mut EventResponse,
) -> Result<(), ApiError> {
    response.participants = UserRepository::new(state.pool.clone())
        .find_participants(&response.id)
        .await?
        .into_iter()
        .map(|u| ParticipantResponse::from(User::from(u)))
        .collect();

    response.my_tickets = TicketRepository::new(state.pool.clone())
        .find_by_event_and_user(&response.id, auth.user_id())
        .await?
        .into_iter()
        .map(|t| TicketResponse::from(Ticket::from(t)))
        .collect();

    response.my_notifications = SubscriptionRepository::new(state.pool.clone())
        .find_for_user(&response.id, auth.user_id())
        .await?
        .into_iter()
        .map(|s| EventSubscription::from(s).topic)
        .collect();

    Ok(())
}
