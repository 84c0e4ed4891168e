//! User repository for database operations.

use domain::models::UserProfile;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

/// Repository for user-related database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, slug, email, full_name, avatar, telegram_id, roles, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a user by slug.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, slug, email, full_name, avatar, telegram_id, roles, created_at, updated_at
            FROM users
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, slug, email, full_name, avatar, telegram_id, roles, created_at, updated_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    /// Members holding at least one ticket for an event, by slug.
    pub async fn find_participants(&self, event_id: &str) -> Result<Vec<UserEntity>, sqlx::Error> {
        sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT u.id, u.slug, u.email, u.full_name, u.avatar, u.telegram_id, u.roles,
                   u.created_at, u.updated_at
            FROM users u
            WHERE EXISTS (SELECT 1 FROM tickets t WHERE t.user_id = u.id AND t.event_id = $1)
            ORDER BY u.slug ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Create a user or refresh an existing one matched by email or slug.
    pub async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_user_profile");
        let mut tx = self.pool.begin().await?;

        let existing: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM users
            WHERE LOWER(email) = LOWER($1) OR slug = $2
            ORDER BY (LOWER(email) = LOWER($1)) DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(&profile.email)
        .bind(&profile.slug)
        .fetch_optional(&mut *tx)
        .await?;

        let user = match existing {
            Some((id,)) => {
                sqlx::query_as::<_, UserEntity>(
                    r#"
                    UPDATE users
                    SET slug = $2, email = $3, full_name = $4, avatar = $5,
                        telegram_id = COALESCE($6, telegram_id), updated_at = NOW()
                    WHERE id = $1
                    RETURNING id, slug, email, full_name, avatar, telegram_id, roles, created_at, updated_at
                    "#,
                )
                .bind(id)
                .bind(&profile.slug)
                .bind(&profile.email)
                .bind(&profile.full_name)
                .bind(&profile.avatar)
                .bind(&profile.telegram_id)
                .fetch_one(&mut *tx)
                .await?
            }
            None => {
                sqlx::query_as::<_, UserEntity>(
                    r#"
                    INSERT INTO users (slug, email, full_name, avatar, telegram_id)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id, slug, email, full_name, avatar, telegram_id, roles, created_at, updated_at
                    "#,
                )
                .bind(&profile.slug)
                .bind(&profile.email)
                .bind(&profile.full_name)
                .bind(&profile.avatar)
                .bind(&profile.telegram_id)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        timer.record();
        Ok(user)
    }

    /// Replace a user's roles.
    pub async fn set_roles(&self, id: Uuid, roles: &[String]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET roles = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(roles)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
