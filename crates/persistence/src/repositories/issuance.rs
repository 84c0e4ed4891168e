//! Transactional ticket issuance and revocation.
//!
//! Lock order is always event row, then ticket type row. Holding the event
//! lock serializes every issuance for that event, which keeps both the code
//! sequence and the sibling counts used by the ledger stable.

use domain::services::inventory;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use super::ledger::{InventoryLedger, LedgerOutcome};
use super::ticket_type::TICKET_TYPE_COLUMNS;
use crate::entities::{TicketEntity, TicketTypeEntity};
use crate::metrics::QueryTimer;

/// Reasons a ticket cannot be issued.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Ticket type not found: {0}")]
    TicketTypeNotFound(Uuid),

    #[error("Ticket type {name} is sold out ({limit} tickets)")]
    SoldOut {
        ticket_type_id: Uuid,
        name: String,
        limit: i32,
    },

    #[error("Per-user limit of {limit} reached for ticket type {ticket_type_id}")]
    PerUserLimitExceeded { ticket_type_id: Uuid, limit: i32 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IssueError {
    /// Capacity rejections, as opposed to missing rows or storage failures.
    pub fn is_capacity(&self) -> bool {
        matches!(
            self,
            IssueError::SoldOut { .. } | IssueError::PerUserLimitExceeded { .. }
        )
    }
}

/// Everything needed to issue one ticket.
#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub event_id: String,
    pub ticket_type_id: Uuid,
    pub user_id: Option<Uuid>,
    pub customer_email: Option<String>,
    pub payment_id: Option<String>,
    pub metadata: serde_json::Value,
    pub session: serde_json::Value,
    /// Apply the type's per-user limit. Paid purchases skip it.
    pub enforce_per_user_limit: bool,
}

/// A freshly issued ticket and the ledger state it produced.
#[derive(Debug, Clone)]
pub struct IssuedTicket {
    pub ticket: TicketEntity,
    pub ticket_type: TicketTypeEntity,
    pub ledger: LedgerOutcome,
}

impl IssuedTicket {
    pub fn became_sold_out(&self) -> bool {
        self.ledger.became_sold_out
    }
}

/// Issues and revokes tickets under row locks.
#[derive(Clone)]
pub struct TicketIssuer {
    pool: PgPool,
}

impl TicketIssuer {
    /// Creates a new TicketIssuer with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Issues one ticket in its own transaction.
    pub async fn issue(&self, request: &IssueRequest) -> Result<IssuedTicket, IssueError> {
        let mut tx = self.pool.begin().await?;
        let issued = Self::issue_in_tx(&mut tx, request).await?;
        tx.commit().await?;
        Ok(issued)
    }

    /// Issues one ticket inside the caller's transaction.
    ///
    /// On error nothing has been written by this call, but the caller is
    /// expected to roll the transaction back.
    pub async fn issue_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        request: &IssueRequest,
    ) -> Result<IssuedTicket, IssueError> {
        let timer = QueryTimer::new("issue_ticket");

        let event: Option<(String,)> = sqlx::query_as("SELECT id FROM events WHERE id = $1 FOR UPDATE")
            .bind(&request.event_id)
            .fetch_optional(&mut **tx)
            .await?;
        if event.is_none() {
            return Err(IssueError::EventNotFound(request.event_id.clone()));
        }

        let ticket_type = sqlx::query_as::<_, TicketTypeEntity>(&format!(
            "SELECT {} FROM ticket_types WHERE id = $1 AND event_id = $2 FOR UPDATE",
            TICKET_TYPE_COLUMNS
        ))
        .bind(request.ticket_type_id)
        .bind(&request.event_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(IssueError::TicketTypeNotFound(request.ticket_type_id))?;

        let sold: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tickets WHERE ticket_type_id = $1")
            .bind(ticket_type.id)
            .fetch_one(&mut **tx)
            .await?;
        if !inventory::has_capacity(ticket_type.limit_quantity, sold.0) {
            return Err(IssueError::SoldOut {
                ticket_type_id: ticket_type.id,
                name: ticket_type.name.clone(),
                limit: ticket_type.limit_quantity,
            });
        }

        if let (true, Some(user_id)) = (request.enforce_per_user_limit, request.user_id) {
            if ticket_type.limit_per_user > 0 {
                let owned: (i64,) = sqlx::query_as(
                    "SELECT COUNT(*) FROM tickets WHERE ticket_type_id = $1 AND user_id = $2",
                )
                .bind(ticket_type.id)
                .bind(user_id)
                .fetch_one(&mut **tx)
                .await?;
                if !inventory::within_per_user_limit(ticket_type.limit_per_user, owned.0) {
                    return Err(IssueError::PerUserLimitExceeded {
                        ticket_type_id: ticket_type.id,
                        limit: ticket_type.limit_per_user,
                    });
                }
            }
        }

        let code: (i32,) = sqlx::query_as(
            r#"
            UPDATE events
            SET ticket_sequence = ticket_sequence + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING ticket_sequence
            "#,
        )
        .bind(&request.event_id)
        .fetch_one(&mut **tx)
        .await?;

        let ticket = sqlx::query_as::<_, TicketEntity>(
            r#"
            INSERT INTO tickets (code, user_id, customer_email, payment_id, event_id,
                                 ticket_type_id, metadata, session)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, code, user_id, customer_email, payment_id, event_id,
                      ticket_type_id, metadata, session, created_at
            "#,
        )
        .bind(code.0)
        .bind(request.user_id)
        .bind(&request.customer_email)
        .bind(&request.payment_id)
        .bind(&request.event_id)
        .bind(ticket_type.id)
        .bind(&request.metadata)
        .bind(&request.session)
        .fetch_one(&mut **tx)
        .await?;

        let ledger = InventoryLedger::record_sale_in_tx(tx, ticket_type.id).await?;
        timer.record();

        tracing::info!(
            ticket_id = %ticket.id,
            event_id = %ticket.event_id,
            ticket_type_id = %ticket_type.id,
            code = ticket.code,
            became_sold_out = ledger.became_sold_out,
            "Ticket issued"
        );

        Ok(IssuedTicket {
            ticket,
            ticket_type,
            ledger,
        })
    }

    /// Deletes a ticket and re-derives its type's ledger.
    ///
    /// The type may leave sold-out; the event flag is left as it is.
    /// Returns `None` when the ticket does not exist.
    pub async fn revoke(&self, ticket_id: Uuid) -> Result<Option<LedgerOutcome>, sqlx::Error> {
        let timer = QueryTimer::new("revoke_ticket");
        let mut tx = self.pool.begin().await?;

        let owner: Option<(String, Uuid)> =
            sqlx::query_as("SELECT event_id, ticket_type_id FROM tickets WHERE id = $1")
                .bind(ticket_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((event_id, ticket_type_id)) = owner else {
            return Ok(None);
        };

        sqlx::query("SELECT id FROM events WHERE id = $1 FOR UPDATE")
            .bind(&event_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("SELECT id FROM ticket_types WHERE id = $1 FOR UPDATE")
            .bind(ticket_type_id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(ticket_id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Ok(None);
        }

        let outcome = InventoryLedger::recount_in_tx(&mut tx, ticket_type_id).await?;
        tx.commit().await?;
        timer.record();

        tracing::info!(
            ticket_id = %ticket_id,
            event_id = %event_id,
            tickets_sold = outcome.tickets_sold,
            "Ticket revoked"
        );
        Ok(Some(outcome))
    }
}
