//! Club membership directory client.
//!
//! Member profiles are served at `{base_url}/user/{slug}.json` and require a
//! service token.

use async_trait::async_trait;
use domain::models::UserProfile;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::ClubConfig;

const CLUB_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, thiserror::Error)]
pub enum ClubError {
    #[error("Club service token is not configured")]
    NotConfigured,

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Club API returned {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Missing slug or email in club profile of {0}")]
    IncompleteProfile(String),
}

/// Source of member profiles by slug.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profile(&self, slug: &str) -> Result<UserProfile, ClubError>;
}

/// Payload is either `{"user": {...}}` or the bare user object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProfileEnvelope {
    Wrapped { user: ClubUser },
    Bare(ClubUser),
}

#[derive(Debug, Default, Deserialize)]
struct ClubUser {
    slug: Option<String>,
    email: Option<String>,
    full_name: Option<String>,
    avatar: Option<String>,
    telegram: Option<ClubTelegram>,
}

#[derive(Debug, Deserialize)]
struct ClubTelegram {
    id: Option<serde_json::Value>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Builds a profile from a club payload, falling back to the requested slug.
fn parse_profile(payload: serde_json::Value, requested_slug: &str) -> Result<UserProfile, ClubError> {
    let user = match serde_json::from_value::<ProfileEnvelope>(payload) {
        Ok(ProfileEnvelope::Wrapped { user }) | Ok(ProfileEnvelope::Bare(user)) => user,
        Err(_) => ClubUser::default(),
    };

    let slug = non_blank(user.slug).or_else(|| non_blank(Some(requested_slug.to_string())));
    let email = non_blank(user.email);
    let (Some(slug), Some(email)) = (slug, email) else {
        return Err(ClubError::IncompleteProfile(requested_slug.to_string()));
    };

    let telegram_id = user
        .telegram
        .and_then(|t| t.id)
        .and_then(|id| match id {
            serde_json::Value::String(s) if !s.is_empty() => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

    Ok(UserProfile {
        slug,
        email,
        full_name: non_blank(user.full_name),
        avatar: non_blank(user.avatar),
        telegram_id,
    })
}

/// HTTP client for the club directory.
#[derive(Clone)]
pub struct ClubClient {
    client: Client,
    config: ClubConfig,
}

impl ClubClient {
    pub fn new(config: ClubConfig) -> Result<Self, ClubError> {
        if config.service_token.is_empty() {
            return Err(ClubError::NotConfigured);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(CLUB_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, config })
    }

    fn profile_url(&self, slug: &str) -> String {
        format!("{}/user/{}.json", self.config.base_url.trim_end_matches('/'), slug)
    }
}

#[async_trait]
impl ProfileSource for ClubClient {
    async fn fetch_profile(&self, slug: &str) -> Result<UserProfile, ClubError> {
        let response = self
            .client
            .get(self.profile_url(slug))
            .query(&[("service_token", &self.config.service_token)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: String = response.text().await.unwrap_or_default().chars().take(300).collect();
            return Err(ClubError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let payload: serde_json::Value = response.json().await?;
        parse_profile(payload, slug)
    }
}
