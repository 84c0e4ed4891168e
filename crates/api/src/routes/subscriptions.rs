//! Announcement subscriptions for signed-in members.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{EventSubscription, SubscriptionTopic};
use persistence::repositories::{EventRepository, SubscriptionRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

fn parse_topic(raw: &str) -> Result<SubscriptionTopic, ApiError> {
    raw.parse::<SubscriptionTopic>().map_err(ApiError::Validation)
}

/// Subscribe the caller's e-mail to an event topic.
///
/// POST /api/v1/events/:event_id/subscriptions/:topic
pub async fn subscribe(
    State(state): State<AppState>,
    auth: UserAuth,
    Path((event_id, topic)): Path<(String, String)>,
) -> Result<(StatusCode, Json<EventSubscription>), ApiError> {
    let topic = parse_topic(&topic)?;

    EventRepository::new(state.pool.clone())
        .find_by_id(&event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Event {} not found", event_id)))?;

    let subscription = SubscriptionRepository::new(state.pool.clone())
        .subscribe(Some(auth.user_id()), &event_id, &auth.user.email, topic)
        .await?;

    tracing::info!(
        user_id = %auth.user_id(),
        event_id = %event_id,
        topic = %topic,
        "Subscribed to event announcements"
    );

    Ok((StatusCode::CREATED, Json(subscription.into())))
}

/// Drop the caller's subscription to an event topic. Idempotent.
///
/// DELETE /api/v1/events/:event_id/subscriptions/:topic
pub async fn unsubscribe(
    State(state): State<AppState>,
    auth: UserAuth,
    Path((event_id, topic)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let topic = parse_topic(&topic)?;

    let removed = SubscriptionRepository::new(state.pool.clone())
        .unsubscribe(auth.user_id(), &event_id, topic)
        .await?;

    tracing::debug!(event_id = %event_id, topic = %topic, removed, "Unsubscribed");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_topic() {
        assert_eq!(parse_topic("sale").unwrap(), SubscriptionTopic::Sale);
        assert_eq!(parse_topic("ALL").unwrap(), SubscriptionTopic::All);
        assert!(matches!(parse_topic("weekly"), Err(ApiError::Validation(_))));
    }
}
