//! Ticket type repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::TicketTypeEntity;
use crate::metrics::QueryTimer;

pub(crate) const TICKET_TYPE_COLUMNS: &str = r#"
    id, event_id, name, description, price, currency, stripe_price_id,
    stripe_product_id, stripe_payment_link_id, welcome_message_title,
    welcome_message_text, tickets_sold, limit_quantity, limit_per_user,
    checklists, special_code, is_sold_out, is_visible, created_at, updated_at
"#;

/// Fields for creating a ticket type.
#[derive(Debug, Clone)]
pub struct NewTicketType<'a> {
    pub event_id: &'a str,
    pub name: &'a str,
    pub price: f64,
    pub currency: &'a str,
    pub stripe_price_id: Option<&'a str>,
    pub stripe_product_id: Option<&'a str>,
    pub stripe_payment_link_id: Option<&'a str>,
    pub limit_quantity: i32,
    pub limit_per_user: i32,
    pub checklists: Vec<String>,
    pub special_code: Option<&'a str>,
    pub is_visible: bool,
}

impl<'a> NewTicketType<'a> {
    /// A free, unlimited, visible type.
    pub fn free(event_id: &'a str, name: &'a str) -> Self {
        Self {
            event_id,
            name,
            price: 0.0,
            currency: "eur",
            stripe_price_id: None,
            stripe_product_id: None,
            stripe_payment_link_id: None,
            limit_quantity: -1,
            limit_per_user: -1,
            checklists: Vec::new(),
            special_code: None,
            is_visible: true,
        }
    }
}

/// Store-wide inventory counts sampled for the gauges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct InventorySnapshot {
    pub ticket_types: i64,
    pub sold_out_types: i64,
    pub sold_out_events: i64,
}

impl InventorySnapshot {
    /// Ticket types still on sale.
    pub fn open_types(&self) -> i64 {
        (self.ticket_types - self.sold_out_types).max(0)
    }
}

/// Repository for ticket type database operations.
#[derive(Clone)]
pub struct TicketTypeRepository {
    pool: PgPool,
}

impl TicketTypeRepository {
    /// Creates a new TicketTypeRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Find a ticket type by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<TicketTypeEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_ticket_type_by_id");
        let result = sqlx::query_as::<_, TicketTypeEntity>(&format!(
            "SELECT {} FROM ticket_types WHERE id = $1",
            TICKET_TYPE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// All ticket types of an event, oldest first.
    pub async fn find_by_event(&self, event_id: &str) -> Result<Vec<TicketTypeEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_ticket_types_by_event");
        let result = sqlx::query_as::<_, TicketTypeEntity>(&format!(
            "SELECT {} FROM ticket_types WHERE event_id = $1 ORDER BY created_at ASC, id ASC",
            TICKET_TYPE_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Maps a purchased price to its ticket type. A price id match wins over
    /// a product id match.
    pub async fn find_by_stripe_ids(
        &self,
        price_id: &str,
        product_id: Option<&str>,
    ) -> Result<Option<TicketTypeEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_ticket_type_by_stripe_ids");
        let result = sqlx::query_as::<_, TicketTypeEntity>(&format!(
            r#"
            SELECT {} FROM ticket_types
            WHERE stripe_price_id = $1
               OR ($2::TEXT IS NOT NULL AND stripe_product_id = $2)
            ORDER BY (stripe_price_id IS NOT DISTINCT FROM $1) DESC, created_at ASC
            LIMIT 1
            "#,
            TICKET_TYPE_COLUMNS
        ))
        .bind(price_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// The type granted by administrative tools: first visible by creation
    /// time, else the first one.
    pub async fn find_default_for_event(
        &self,
        event_id: &str,
    ) -> Result<Option<TicketTypeEntity>, sqlx::Error> {
        sqlx::query_as::<_, TicketTypeEntity>(&format!(
            r#"
            SELECT {} FROM ticket_types
            WHERE event_id = $1
            ORDER BY is_visible DESC, created_at ASC, id ASC
            LIMIT 1
            "#,
            TICKET_TYPE_COLUMNS
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Create a ticket type.
    pub async fn create(&self, new: NewTicketType<'_>) -> Result<TicketTypeEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_ticket_type");
        let result = sqlx::query_as::<_, TicketTypeEntity>(&format!(
            r#"
            INSERT INTO ticket_types (
                event_id, name, price, currency, stripe_price_id, stripe_product_id,
                stripe_payment_link_id, limit_quantity, limit_per_user, checklists,
                special_code, is_visible
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            TICKET_TYPE_COLUMNS
        ))
        .bind(new.event_id)
        .bind(new.name)
        .bind(new.price)
        .bind(new.currency)
        .bind(new.stripe_price_id)
        .bind(new.stripe_product_id)
        .bind(new.stripe_payment_link_id)
        .bind(new.limit_quantity)
        .bind(new.limit_per_user)
        .bind(&new.checklists)
        .bind(new.special_code)
        .bind(new.is_visible)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Counts ticket types and sold-out flags across visible events.
    pub async fn inventory_snapshot(&self) -> Result<InventorySnapshot, sqlx::Error> {
        let timer = QueryTimer::new("inventory_snapshot");
        let result = sqlx::query_as::<_, InventorySnapshot>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM ticket_types tt
                 JOIN events e ON e.id = tt.event_id
                 WHERE e.is_visible) AS ticket_types,
                (SELECT COUNT(*) FROM ticket_types tt
                 JOIN events e ON e.id = tt.event_id
                 WHERE e.is_visible AND tt.is_sold_out) AS sold_out_types,
                (SELECT COUNT(*) FROM events
                 WHERE is_visible AND is_sold_out) AS sold_out_events
            "#,
        )
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Set the welcome message sent after purchase.
    pub async fn set_welcome_message(
        &self,
        id: Uuid,
        title: Option<&str>,
        text: Option<&str>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE ticket_types
            SET welcome_message_title = $2, welcome_message_text = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(text)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
