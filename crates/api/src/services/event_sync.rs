//! Batch sync of club members into users and, optionally, event tickets.

use domain::models::TicketMetadata;
use persistence::entities::{TicketTypeEntity, UserEntity};
use persistence::repositories::{
    EventRepository, IssueError, IssueRequest, NewTicketType, TicketIssuer, TicketRepository,
    TicketTypeRepository, UserRepository,
};
use sqlx::PgPool;
use thiserror::Error;
use validator::Validate;

use super::club::{ClubError, ProfileSource};
use crate::middleware::metrics::record_tickets_issued;

/// Ticket metadata source marker for synced tickets.
pub const SYNC_SOURCE: &str = "sync_event_users";

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("No slugs provided")]
    NoSlugs,

    #[error("Event with id={0} not found")]
    EventNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Why a single slug failed.
#[derive(Debug, Error)]
pub enum SlugError {
    #[error(transparent)]
    Club(#[from] ClubError),

    #[error("Invalid profile: {0}")]
    InvalidProfile(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Issue(#[from] IssueError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct SyncedUser {
    pub slug: String,
    pub email: String,
    /// Code of the ticket created in this run, if any.
    pub ticket_code: Option<i32>,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub synced: Vec<SyncedUser>,
    pub failed: Vec<(String, String)>,
    pub tickets_created: usize,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Splits `a, b,,c` into trimmed non-empty slugs.
pub fn parse_slugs(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Syncs members from a profile source.
pub struct EventSync<S> {
    pool: PgPool,
    source: S,
}

impl<S: ProfileSource> EventSync<S> {
    pub fn new(pool: PgPool, source: S) -> Self {
        Self { pool, source }
    }

    /// Upserts every slug and, when `event_id` is given, grants one ticket to
    /// each synced member who does not hold one yet. A failing slug does not
    /// stop the run.
    pub async fn run(&self, slugs: &[String], event_id: Option<&str>) -> Result<SyncReport, SyncError> {
        if slugs.is_empty() {
            return Err(SyncError::NoSlugs);
        }

        let ticket_type = match event_id {
            Some(id) => Some(self.default_ticket_type(id).await?),
            None => None,
        };

        let mut report = SyncReport::default();
        for slug in slugs {
            match self.sync_one(slug, ticket_type.as_ref()).await {
                Ok(synced) => {
                    tracing::info!(slug = %synced.slug, email = %synced.email, "Member synced");
                    if synced.ticket_code.is_some() {
                        report.tickets_created += 1;
                    }
                    report.synced.push(synced);
                }
                Err(e) => {
                    tracing::warn!(slug = %slug, error = %e, "Member sync failed");
                    report.failed.push((slug.clone(), e.to_string()));
                }
            }
        }

        record_tickets_issued("sync", report.tickets_created);
        Ok(report)
    }

    /// First visible type by creation time, else the first, else a new free
    /// type named after the event.
    async fn default_ticket_type(&self, event_id: &str) -> Result<TicketTypeEntity, SyncError> {
        let event = EventRepository::new(self.pool.clone())
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| SyncError::EventNotFound(event_id.to_string()))?;

        let ticket_types = TicketTypeRepository::new(self.pool.clone());
        if let Some(existing) = ticket_types.find_default_for_event(&event.id).await? {
            return Ok(existing);
        }

        tracing::info!(event_id = %event.id, "Creating free ticket type for sync");
        Ok(ticket_types
            .create(NewTicketType::free(&event.id, &event.title))
            .await?)
    }

    async fn sync_one(
        &self,
        slug: &str,
        ticket_type: Option<&TicketTypeEntity>,
    ) -> Result<SyncedUser, SlugError> {
        let profile = self.source.fetch_profile(slug).await?;
        profile.validate()?;

        let user: UserEntity = UserRepository::new(self.pool.clone())
            .upsert_profile(&profile)
            .await?;

        let mut ticket_code = None;
        if let Some(ticket_type) = ticket_type {
            let holds_ticket = TicketRepository::new(self.pool.clone())
                .user_has_ticket_for_event(user.id, &ticket_type.event_id)
                .await?;
            if !holds_ticket {
                let issued = TicketIssuer::new(self.pool.clone())
                    .issue(&IssueRequest {
                        event_id: ticket_type.event_id.clone(),
                        ticket_type_id: ticket_type.id,
                        user_id: Some(user.id),
                        customer_email: Some(user.email.clone()),
                        payment_id: None,
                        metadata: TicketMetadata::granted_by(SYNC_SOURCE).to_json(),
                        session: serde_json::json!({}),
                        enforce_per_user_limit: true,
                    })
                    .await?;
                ticket_code = Some(issued.ticket.code);
            }
        }

        Ok(SyncedUser {
            slug: user.slug,
            email: user.email,
            ticket_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slugs() {
        assert_eq!(parse_slugs("vas3k, alice,,bob ,"), vec!["vas3k", "alice", "bob"]);
        assert!(parse_slugs(" , ").is_empty());
    }

    #[test]
    fn test_report_success() {
        let mut report = SyncReport::default();
        assert!(report.is_success());
        report.failed.push(("bob".into(), "HTTP 404".into()));
        assert!(!report.is_success());
    }
}
