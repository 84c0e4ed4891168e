//! Checklist answer tracker.
//!
//! Limited select options are enforced by counting other holders' answers
//! while the checklist row is locked, so two holders racing for the last
//! slot of an option cannot both get it.

use domain::models::{Checklist, ChecklistKind};
use domain::services::checklist::{check_option_capacity, CapacityDecision};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::entities::ChecklistAnswerEntity;
use crate::metrics::QueryTimer;

/// Reasons an answer is refused.
#[derive(Debug, Error)]
pub enum ChecklistError {
    #[error("Option {item} is limited to {limit} holders")]
    OptionLimitReached { item: String, limit: i64 },

    #[error("Unknown option {answer} for checklist {checklist_id}")]
    UnknownOption {
        checklist_id: String,
        answer: String,
    },

    #[error("Checklist {0} is not configured for this ticket")]
    NotInTicketType(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// One holder's answer to one checklist item of a ticket.
#[derive(Debug, Clone)]
pub struct AnswerSubmission<'a> {
    pub ticket_id: Uuid,
    pub event_id: &'a str,
    pub user_id: Uuid,
    pub checklist: &'a Checklist,
    /// Checklist ids configured on the ticket's type.
    pub allowed_checklists: &'a [String],
    /// `None` clears the answer.
    pub answer: Option<&'a str>,
}

/// What a submission did.
#[derive(Debug, Clone)]
pub enum AnswerOutcome {
    Cleared,
    Saved(ChecklistAnswerEntity),
}

/// Repository for checklist answers.
#[derive(Clone)]
pub struct ChecklistAnswerRepository {
    pool: PgPool,
}

impl ChecklistAnswerRepository {
    /// Creates a new ChecklistAnswerRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Records, replaces or clears an answer.
    pub async fn submit(
        &self,
        submission: AnswerSubmission<'_>,
    ) -> Result<AnswerOutcome, ChecklistError> {
        let checklist = submission.checklist;

        let Some(answer) = submission.answer else {
            self.clear(submission.ticket_id, submission.user_id, &checklist.id)
                .await?;
            return Ok(AnswerOutcome::Cleared);
        };

        if !submission.allowed_checklists.contains(&checklist.id) {
            return Err(ChecklistError::NotInTicketType(checklist.id.clone()));
        }

        let timer = QueryTimer::new("submit_checklist_answer");
        let mut tx = self.pool.begin().await?;

        if checklist.kind == ChecklistKind::Select && !checklist.select_options().is_empty() {
            let option = checklist
                .find_option(answer)
                .ok_or_else(|| ChecklistError::UnknownOption {
                    checklist_id: checklist.id.clone(),
                    answer: answer.to_string(),
                })?;

            if option.limit.unwrap_or(0) > 0 {
                sqlx::query("SELECT id FROM ticket_checklists WHERE id = $1 FOR UPDATE")
                    .bind(&checklist.id)
                    .execute(&mut *tx)
                    .await?;

                let taken: (i64,) = sqlx::query_as(
                    r#"
                    SELECT COUNT(*)
                    FROM ticket_checklist_answers a
                    JOIN tickets t ON t.id = a.ticket_id
                    WHERE t.event_id = $1
                      AND a.checklist_id = $2
                      AND a.answer = $3
                      AND a.user_id IS DISTINCT FROM $4
                    "#,
                )
                .bind(submission.event_id)
                .bind(&checklist.id)
                .bind(answer)
                .bind(submission.user_id)
                .fetch_one(&mut *tx)
                .await?;

                if let CapacityDecision::Rejected { limit, taken } =
                    check_option_capacity(&option, taken.0)
                {
                    tracing::info!(
                        checklist_id = %checklist.id,
                        item = %option.item,
                        limit,
                        taken,
                        "Checklist option is full"
                    );
                    return Err(ChecklistError::OptionLimitReached {
                        item: option.item,
                        limit,
                    });
                }
            }
        }

        let saved = sqlx::query_as::<_, ChecklistAnswerEntity>(
            r#"
            INSERT INTO ticket_checklist_answers (ticket_id, user_id, checklist_id, answer)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (ticket_id, user_id, checklist_id)
            DO UPDATE SET answer = EXCLUDED.answer, updated_at = NOW()
            RETURNING id, ticket_id, user_id, checklist_id, answer, created_at, updated_at
            "#,
        )
        .bind(submission.ticket_id)
        .bind(submission.user_id)
        .bind(&checklist.id)
        .bind(answer)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(AnswerOutcome::Saved(saved))
    }

    /// Deletes an answer. Missing answers are not an error.
    pub async fn clear(
        &self,
        ticket_id: Uuid,
        user_id: Uuid,
        checklist_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM ticket_checklist_answers
            WHERE ticket_id = $1 AND user_id = $2 AND checklist_id = $3
            "#,
        )
        .bind(ticket_id)
        .bind(user_id)
        .bind(checklist_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// A holder's answers for a ticket.
    pub async fn find_for_ticket(
        &self,
        ticket_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<ChecklistAnswerEntity>, sqlx::Error> {
        sqlx::query_as::<_, ChecklistAnswerEntity>(
            r#"
            SELECT id, ticket_id, user_id, checklist_id, answer, created_at, updated_at
            FROM ticket_checklist_answers
            WHERE ticket_id = $1 AND user_id = $2
            "#,
        )
        .bind(ticket_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// `(checklist_id, answer)` for every answer on the event's tickets.
    pub async fn event_answer_rows(
        &self,
        event_id: &str,
    ) -> Result<Vec<(String, String)>, sqlx::Error> {
        sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT a.checklist_id, a.answer
            FROM ticket_checklist_answers a
            JOIN tickets t ON t.id = a.ticket_id
            WHERE t.event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
    }
}
