//! Ticket views and checklist answers for ticket holders.

use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use domain::models::{
    Checklist, ChecklistKind, SelectOption, SubmitAnswerRequest, Ticket, TicketResponse,
    TicketType, TicketTypeResponse,
};
use domain::services::{aggregate_answer_stats, is_checklist_completed, AnswerStats};
use persistence::entities::HeldTicketEntity;
use persistence::repositories::{
    AnswerOutcome, AnswerSubmission, ChecklistAnswerRepository, ChecklistError,
    ChecklistRepository, TicketRepository, TicketTypeRepository,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_checklist_capacity_rejection;

#[derive(Debug, Serialize)]
pub struct ChecklistItemResponse {
    pub id: String,
    pub name: String,
    pub kind: ChecklistKind,
    pub is_required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    pub answer: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TicketDetailResponse {
    pub ticket: TicketResponse,
    pub ticket_type: TicketTypeResponse,
    pub checklist: Vec<ChecklistItemResponse>,
    pub checklist_completed: bool,
    /// checklist id -> answer -> number of holders across the event
    pub answer_stats: AnswerStats,
}

/// A ticket in the holder's list, with what it is for.
#[derive(Debug, Serialize)]
pub struct HeldTicketResponse {
    #[serde(flatten)]
    pub ticket: TicketResponse,
    pub event_title: String,
    pub event_starts_at: Option<DateTime<Utc>>,
    pub ticket_type_name: String,
}

impl From<HeldTicketEntity> for HeldTicketResponse {
    fn from(entity: HeldTicketEntity) -> Self {
        Self {
            ticket: Ticket::from(entity.ticket).into(),
            event_title: entity.event_title,
            event_starts_at: entity.event_starts_at,
            ticket_type_name: entity.ticket_type_name,
        }
    }
}

fn checklist_items(
    checklists: Vec<Checklist>,
    answers: &HashMap<String, String>,
) -> Vec<ChecklistItemResponse> {
    checklists
        .into_iter()
        .map(|c| ChecklistItemResponse {
            options: c.select_options(),
            answer: answers.get(&c.id).cloned(),
            id: c.id,
            name: c.name,
            kind: c.kind,
            is_required: c.is_required,
        })
        .collect()
}

/// Loads a ticket the caller owns, with its type.
async fn owned_ticket(
    state: &AppState,
    auth: &UserAuth,
    ticket_id: Uuid,
) -> Result<(Ticket, TicketType), ApiError> {
    let ticket: Ticket = TicketRepository::new(state.pool.clone())
        .find_by_id(ticket_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))?
        .into();

    if !ticket.is_owned_by(auth.user_id()) {
        return Err(ApiError::Forbidden("This is not your ticket".to_string()));
    }

    let ticket_type: TicketType = TicketTypeRepository::new(state.pool.clone())
        .find_by_id(ticket.ticket_type_id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("Ticket {} has no ticket type", ticket.id)))?
        .into();

    Ok((ticket, ticket_type))
}

/// List the caller's tickets across all events, newest first.
///
/// GET /api/v1/me/tickets
pub async fn list_my_tickets(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<Vec<HeldTicketResponse>>, ApiError> {
    let tickets = TicketRepository::new(state.pool.clone())
        .find_held_by_user(auth.user_id())
        .await?
        .into_iter()
        .map(HeldTicketResponse::from)
        .collect();
    Ok(Json(tickets))
}

/// Get a ticket with its checklist, the holder's answers and event-wide
/// answer tallies.
///
/// GET /api/v1/tickets/:ticket_id
pub async fn get_ticket(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<TicketDetailResponse>, ApiError> {
    let (ticket, ticket_type) = owned_ticket(&state, &auth, ticket_id).await?;

    let checklists: Vec<Checklist> = ChecklistRepository::new(state.pool.clone())
        .find_by_ids(&ticket_type.checklists)
        .await?
        .into_iter()
        .map(Checklist::from)
        .collect();

    let answers_repo = ChecklistAnswerRepository::new(state.pool.clone());
    let answers: HashMap<String, String> = answers_repo
        .find_for_ticket(ticket.id, auth.user_id())
        .await?
        .into_iter()
        .map(|a| (a.checklist_id, a.answer))
        .collect();
    let answer_stats = aggregate_answer_stats(answers_repo.event_answer_rows(&ticket.event_id).await?);

    let answered: HashSet<String> = answers.keys().cloned().collect();
    let checklist_completed = is_checklist_completed(&checklists, &answered);

    Ok(Json(TicketDetailResponse {
        checklist: checklist_items(checklists, &answers),
        checklist_completed,
        answer_stats,
        ticket: ticket.into(),
        ticket_type: ticket_type.into(),
    }))
}

/// Record, replace or clear the holder's answer to one checklist item.
///
/// POST /api/v1/tickets/:ticket_id/checklist/answers
pub async fn submit_answer(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(ticket_id): Path<Uuid>,
    Json(request): Json<SubmitAnswerRequest>,
) -> Result<StatusCode, ApiError> {
    request.validate()?;

    let (ticket, ticket_type) = owned_ticket(&state, &auth, ticket_id).await?;

    let checklist: Checklist = ChecklistRepository::new(state.pool.clone())
        .find_by_id(&request.checklist_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Checklist item not found".to_string()))?
        .into();

    let outcome = ChecklistAnswerRepository::new(state.pool.clone())
        .submit(AnswerSubmission {
            ticket_id: ticket.id,
            event_id: &ticket.event_id,
            user_id: auth.user_id(),
            checklist: &checklist,
            allowed_checklists: &ticket_type.checklists,
            answer: request.normalized_answer(),
        })
        .await;

    match outcome {
        Ok(AnswerOutcome::Cleared) => {
            tracing::debug!(ticket_id = %ticket.id, checklist_id = %checklist.id, "Answer cleared");
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(AnswerOutcome::Saved(_)) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            if matches!(e, ChecklistError::OptionLimitReached { .. }) {
                record_checklist_capacity_rejection();
            }
            Err(e.into())
        }
    }
}
