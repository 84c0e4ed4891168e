//! Checklist and checklist answer entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::ChecklistKind;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the ticket_checklists table.
#[derive(Debug, Clone, FromRow)]
pub struct ChecklistEntity {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub value: Option<serde_json::Value>,
    pub is_required: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ChecklistEntity> for domain::models::Checklist {
    fn from(entity: ChecklistEntity) -> Self {
        Self {
            kind: entity.kind.parse().unwrap_or(ChecklistKind::Text),
            id: entity.id,
            name: entity.name,
            value: entity.value,
            is_required: entity.is_required,
            created_at: entity.created_at,
        }
    }
}

/// Database row mapping for the ticket_checklist_answers table.
#[derive(Debug, Clone, FromRow)]
pub struct ChecklistAnswerEntity {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub user_id: Option<Uuid>,
    pub checklist_id: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ChecklistAnswerEntity> for domain::models::ChecklistAnswer {
    fn from(entity: ChecklistAnswerEntity) -> Self {
        Self {
            id: entity.id,
            ticket_id: entity.ticket_id,
            user_id: entity.user_id,
            checklist_id: entity.checklist_id,
            answer: entity.answer,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checklist_entity_kind_parsing() {
        let entity = ChecklistEntity {
            id: "food".to_string(),
            name: "Food".to_string(),
            kind: "select".to_string(),
            value: Some(serde_json::json!([{"item": "vegan", "limit": 1}])),
            is_required: true,
            created_at: Utc::now(),
        };
        let checklist: domain::models::Checklist = entity.into();
        assert_eq!(checklist.kind, ChecklistKind::Select);
        assert_eq!(checklist.select_options().len(), 1);
    }

    #[test]
    fn test_unknown_kind_degrades_to_text() {
        let entity = ChecklistEntity {
            id: "misc".to_string(),
            name: "Misc".to_string(),
            kind: "checkbox".to_string(),
            value: None,
            is_required: false,
            created_at: Utc::now(),
        };
        let checklist: domain::models::Checklist = entity.into();
        assert_eq!(checklist.kind, ChecklistKind::Text);
    }
}
