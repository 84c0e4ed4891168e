//! Inventory ledger: derives cached sold counts and sold-out flags.
//!
//! Every function here runs inside a caller's transaction that already holds
//! the event row lock and the ticket type row lock, so live counts cannot
//! move underneath it.

use domain::services::inventory::{self, TypeAvailability};
use sqlx::{FromRow, Postgres, Transaction};
use uuid::Uuid;

use crate::metrics::{record_sold_out, QueryTimer};

/// Ledger state of a ticket type after a recount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerOutcome {
    pub ticket_type_id: Uuid,
    pub tickets_sold: i32,
    pub type_sold_out: bool,
    /// The type crossed into sold-out in this recount.
    pub became_sold_out: bool,
    /// The event crossed into sold-out in this recount.
    pub event_became_sold_out: bool,
}

#[derive(Debug, FromRow)]
struct LedgerRow {
    event_id: String,
    limit_quantity: i32,
    is_sold_out: bool,
}

#[derive(Debug, FromRow)]
struct SiblingRow {
    limit_quantity: i32,
    is_special: bool,
    sold: i64,
}

/// Inventory ledger operations.
pub struct InventoryLedger;

impl InventoryLedger {
    /// Recounts a type after a sale and propagates sold-out to its event.
    ///
    /// The event flag is only ever set, never cleared.
    pub async fn record_sale_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        ticket_type_id: Uuid,
    ) -> Result<LedgerOutcome, sqlx::Error> {
        let timer = QueryTimer::new("ledger_record_sale");
        let mut outcome = Self::recount_in_tx(tx, ticket_type_id).await?;

        if outcome.became_sold_out {
            record_sold_out("ticket_type");
            let event_id: (String,) =
                sqlx::query_as("SELECT event_id FROM ticket_types WHERE id = $1")
                    .bind(ticket_type_id)
                    .fetch_one(&mut **tx)
                    .await?;
            outcome.event_became_sold_out = Self::mark_event_if_sold_out(tx, &event_id.0).await?;
        }

        timer.record();
        Ok(outcome)
    }

    /// Re-derives `tickets_sold` and `is_sold_out` of a type from the live
    /// ticket count. Used after sales and after revocations.
    pub async fn recount_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        ticket_type_id: Uuid,
    ) -> Result<LedgerOutcome, sqlx::Error> {
        let row = sqlx::query_as::<_, LedgerRow>(
            "SELECT event_id, limit_quantity, is_sold_out FROM ticket_types WHERE id = $1",
        )
        .bind(ticket_type_id)
        .fetch_one(&mut **tx)
        .await?;

        let live: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tickets WHERE ticket_type_id = $1")
            .bind(ticket_type_id)
            .fetch_one(&mut **tx)
            .await?;

        let state = inventory::ledger_after_recount(row.limit_quantity, row.is_sold_out, live.0);

        sqlx::query(
            r#"
            UPDATE ticket_types
            SET tickets_sold = $2, is_sold_out = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(ticket_type_id)
        .bind(state.tickets_sold)
        .bind(state.is_sold_out)
        .execute(&mut **tx)
        .await?;

        tracing::debug!(
            ticket_type_id = %ticket_type_id,
            event_id = %row.event_id,
            tickets_sold = state.tickets_sold,
            is_sold_out = state.is_sold_out,
            "Ticket type recounted"
        );

        Ok(LedgerOutcome {
            ticket_type_id,
            tickets_sold: state.tickets_sold,
            type_sold_out: state.is_sold_out,
            became_sold_out: state.became_sold_out,
            event_became_sold_out: false,
        })
    }

    /// Re-scans every type of the event with live counts and sets the event
    /// sold-out flag when no regular type is available. Returns whether the
    /// flag flipped.
    async fn mark_event_if_sold_out(
        tx: &mut Transaction<'_, Postgres>,
        event_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let siblings = sqlx::query_as::<_, SiblingRow>(
            r#"
            SELECT tt.limit_quantity,
                   tt.special_code IS NOT NULL AS is_special,
                   (SELECT COUNT(*) FROM tickets t WHERE t.ticket_type_id = tt.id) AS sold
            FROM ticket_types tt
            WHERE tt.event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_all(&mut **tx)
        .await?;

        let availability: Vec<TypeAvailability> = siblings
            .iter()
            .map(|s| TypeAvailability {
                limit_quantity: s.limit_quantity,
                sold: s.sold,
                is_special: s.is_special,
            })
            .collect();

        if !inventory::is_event_sold_out(&availability) {
            return Ok(false);
        }

        let result = sqlx::query(
            "UPDATE events SET is_sold_out = TRUE, updated_at = NOW() WHERE id = $1 AND is_sold_out = FALSE",
        )
        .bind(event_id)
        .execute(&mut **tx)
        .await?;

        let flipped = result.rows_affected() == 1;
        if flipped {
            record_sold_out("event");
            tracing::info!(event_id = %event_id, "Event sold out");
        }
        Ok(flipped)
    }
}
