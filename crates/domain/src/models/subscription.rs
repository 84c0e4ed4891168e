//! Event announcement subscriptions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Announcement topic a subscriber opted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTopic {
    All,
    Sale,
}

impl SubscriptionTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTopic::All => "all",
            SubscriptionTopic::Sale => "sale",
        }
    }
}

impl FromStr for SubscriptionTopic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(SubscriptionTopic::All),
            "sale" => Ok(SubscriptionTopic::Sale),
            _ => Err(format!("Invalid subscription topic: {}", s)),
        }
    }
}

impl fmt::Display for SubscriptionTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An e-mail subscribed to an event topic. Unique per (event, email, topic).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSubscription {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub event_id: String,
    pub email: String,
    pub topic: SubscriptionTopic,
    pub created_at: DateTime<Utc>,
}

/// A subscriber to notify, with the linked member's chat id if any.
#[derive(Debug, Clone)]
pub struct AnnouncementRecipient {
    pub email: String,
    pub telegram_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_round_trip() {
        for topic in [SubscriptionTopic::All, SubscriptionTopic::Sale] {
            assert_eq!(topic.as_str().parse::<SubscriptionTopic>().unwrap(), topic);
        }
        assert!("weekly".parse::<SubscriptionTopic>().is_err());
    }
}
