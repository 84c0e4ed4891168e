//! Club member domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Role granting access to the admin routes.
pub const ADMIN_ROLE: &str = "admin";

/// A club member who can hold tickets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
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

impl User {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == ADMIN_ROLE)
    }
}

/// What other members see about a participant.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantResponse {
    pub slug: String,
    pub full_name: Option<String>,
    pub avatar: Option<String>,
}

impl From<User> for ParticipantResponse {
    fn from(user: User) -> Self {
        Self {
            slug: user.slug,
            full_name: user.full_name,
            avatar: user.avatar,
        }
    }
}

/// Profile fields used to create or refresh a member record.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserProfile {
    #[validate(custom(function = "shared::validation::validate_user_slug"))]
    pub slug: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub full_name: Option<String>,
    pub avatar: Option<String>,
    pub telegram_id: Option<String>,
}
