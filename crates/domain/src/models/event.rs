//! Event domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event with its own ticket types and sale window.
///
/// `id` is the stable slug used in public URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub sale_starts_at: Option<DateTime<Utc>>,
    pub sale_ends_at: Option<DateTime<Utc>>,
    pub event_starts_at: Option<DateTime<Utc>>,
    pub event_ends_at: Option<DateTime<Utc>>,
    pub is_visible: bool,
    /// Only ever flips false -> true, driven by the inventory ledger.
    pub is_sold_out: bool,
    /// Last ticket code handed out for this event.
    pub ticket_sequence: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Whether tickets can be bought right now.
    pub fn is_sale_active(&self, now: DateTime<Utc>) -> bool {
        if self.is_sold_out {
            return false;
        }
        let Some(starts_at) = self.sale_starts_at else {
            return false;
        };
        match self.sale_ends_at {
            Some(ends_at) => starts_at <= now && now <= ends_at,
            None => starts_at <= now,
        }
    }

    /// Whether the sale has a start date in the future.
    pub fn is_sale_starts_soon(&self, now: DateTime<Utc>) -> bool {
        if self.is_sold_out {
            return false;
        }
        matches!(self.sale_starts_at, Some(starts_at) if starts_at > now)
    }

    /// Whether the event starts at or after `now`; `None` when unscheduled.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> Option<bool> {
        self.event_starts_at.map(|starts_at| starts_at >= now)
    }

    /// Seconds until the sale opens, zero when open, closed or sold out.
    pub fn seconds_until_sale_starts(&self, now: DateTime<Utc>) -> i64 {
        if self.is_sold_out {
            return 0;
        }
        match self.sale_starts_at {
            Some(starts_at) if starts_at > now => (starts_at - now).num_seconds(),
            _ => 0,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;

    pub(crate) fn sample_event() -> Event {
        let now = Utc::now();
        Event {
            id: "camp2026".to_string(),
            title: "Club Camp 2026".to_string(),
            description: None,
            location: Some("Forest".to_string()),
            sale_starts_at: None,
            sale_ends_at: None,
            event_starts_at: None,
            event_ends_at: None,
            is_visible: true,
            is_sold_out: false,
            ticket_sequence: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_sale_inactive_without_start() {
        let event = sample_event();
        assert!(!event.is_sale_active(Utc::now()));
        assert!(!event.is_sale_starts_soon(Utc::now()));
        assert_eq!(event.seconds_until_sale_starts(Utc::now()), 0);
    }

    #[test]
    fn test_sale_active_open_ended() {
        let now = Utc::now();
        let mut event = sample_event();
        event.sale_starts_at = Some(now - Duration::hours(1));
        assert!(event.is_sale_active(now));
    }

    #[test]
    fn test_sale_active_within_window() {
        let now = Utc::now();
        let mut event = sample_event();
        event.sale_starts_at = Some(now - Duration::hours(1));
        event.sale_ends_at = Some(now + Duration::hours(1));
        assert!(event.is_sale_active(now));

        event.sale_ends_at = Some(now - Duration::minutes(1));
        assert!(!event.is_sale_active(now));
    }

    #[test]
    fn test_sold_out_closes_sale() {
        let now = Utc::now();
        let mut event = sample_event();
        event.sale_starts_at = Some(now - Duration::hours(1));
        event.is_sold_out = true;
        assert!(!event.is_sale_active(now));
        assert_eq!(event.seconds_until_sale_starts(now), 0);
    }

    #[test]
    fn test_is_upcoming() {
        let now = Utc::now();
        let mut event = sample_event();
        assert_eq!(event.is_upcoming(now), None);

        event.event_starts_at = Some(now);
        assert_eq!(event.is_upcoming(now), Some(true));
        event.event_starts_at = Some(now - Duration::days(1));
        assert_eq!(event.is_upcoming(now), Some(false));
    }

    #[test]
    fn test_sale_starts_soon() {
        let now = Utc::now();
        let mut event = sample_event();
        event.sale_starts_at = Some(now + Duration::seconds(90));
        assert!(event.is_sale_starts_soon(now));
        assert!(!event.is_sale_active(now));
        assert_eq!(event.seconds_until_sale_starts(now), 90);
    }
}
