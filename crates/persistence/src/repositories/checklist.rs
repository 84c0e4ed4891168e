//! Checklist item repository.

use domain::models::ChecklistKind;
use sqlx::PgPool;

use crate::entities::ChecklistEntity;

/// Repository for checklist item definitions.
#[derive(Clone)]
pub struct ChecklistRepository {
    pool: PgPool,
}

impl ChecklistRepository {
    /// Creates a new ChecklistRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a checklist item by id.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<ChecklistEntity>, sqlx::Error> {
        sqlx::query_as::<_, ChecklistEntity>(
            "SELECT id, name, kind, value, is_required, created_at FROM ticket_checklists WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Items for the given ids, in the order the ids are listed. Unknown ids
    /// are skipped.
    pub async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<ChecklistEntity>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut items = sqlx::query_as::<_, ChecklistEntity>(
            "SELECT id, name, kind, value, is_required, created_at FROM ticket_checklists WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        items.sort_by_key(|item| ids.iter().position(|id| id == &item.id));
        Ok(items)
    }

    /// Create a checklist item.
    pub async fn create(
        &self,
        id: &str,
        name: &str,
        kind: ChecklistKind,
        value: Option<serde_json::Value>,
        is_required: bool,
    ) -> Result<ChecklistEntity, sqlx::Error> {
        sqlx::query_as::<_, ChecklistEntity>(
            r#"
            INSERT INTO ticket_checklists (id, name, kind, value, is_required)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, kind, value, is_required, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(kind.as_str())
        .bind(value)
        .bind(is_required)
        .fetch_one(&self.pool)
        .await
    }
}
