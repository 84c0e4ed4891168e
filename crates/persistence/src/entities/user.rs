//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub slug: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar: Option<String>,
    pub telegram_id: Option<String>,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserEntity> for domain::models::User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            slug: entity.slug,
            email: entity.email,
            full_name: entity.full_name,
            avatar: entity.avatar,
            telegram_id: entity.telegram_id,
            roles: entity.roles,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
