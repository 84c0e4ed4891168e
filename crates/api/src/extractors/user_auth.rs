//! Bearer token extractors.
//!
//! The token's subject is the member id; the member must still exist.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::User;
use persistence::repositories::UserRepository;
use shared::jwt::{extract_user_id, JwtConfig};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Extracts the token from an `Authorization: Bearer <token>` value.
fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header format".to_string()))
}

fn authenticate(jwt: &JwtConfig, token: &str) -> Result<Uuid, ApiError> {
    let claims = jwt.validate_access_token(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        ApiError::Unauthorized("Invalid or expired token".to_string())
    })?;
    extract_user_id(&claims).map_err(|_| ApiError::Unauthorized("Invalid token subject".to_string()))
}

/// An authenticated member.
#[derive(Debug, Clone)]
pub struct UserAuth {
    pub user: User,
}

impl UserAuth {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user_id = authenticate(&state.jwt, token)?;

        let user = UserRepository::new(state.pool.clone())
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

        Ok(Self { user: user.into() })
    }
}

/// An authenticated member holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let UserAuth { user } = UserAuth::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, "Non-admin attempted an admin action");
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }
        Ok(Self { user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def"))).unwrap(), "abc.def");
        assert!(bearer_token(&parts_with(None)).is_err());
        assert!(bearer_token(&parts_with(Some("Basic dXNlcg=="))).is_err());
        assert!(bearer_token(&parts_with(Some("Bearer   "))).is_err());
    }

    #[test]
    fn test_authenticate_rejects_bad_token() {
        let jwt = JwtConfig::verifier(include_str!("../../tests/fixtures/jwt_public.pem"), 0).unwrap();
        assert!(matches!(
            authenticate(&jwt, "not.a.token"),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
