//! Checklist answer rules: option capacity, completion and statistics.

use std::collections::{BTreeMap, HashSet};

use crate::models::{Checklist, SelectOption};

/// Outcome of checking a select option against its capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapacityDecision {
    Unlimited,
    Allowed { limit: i64, taken: i64 },
    Rejected { limit: i64, taken: i64 },
}

impl CapacityDecision {
    pub fn is_rejected(&self) -> bool {
        matches!(self, CapacityDecision::Rejected { .. })
    }
}

/// Decides whether one more holder may pick `option`.
///
/// `taken_by_others` counts answers with the same value by other users; a
/// user re-submitting their own answer never counts against themselves.
/// Limits of zero or less are treated as unlimited.
pub fn check_option_capacity(option: &SelectOption, taken_by_others: i64) -> CapacityDecision {
    match option.limit {
        Some(limit) if limit > 0 => {
            if taken_by_others >= limit {
                CapacityDecision::Rejected {
                    limit,
                    taken: taken_by_others,
                }
            } else {
                CapacityDecision::Allowed {
                    limit,
                    taken: taken_by_others,
                }
            }
        }
        _ => CapacityDecision::Unlimited,
    }
}

/// Human-facing title and message for a full option.
pub fn capacity_error_text(item: &str, limit: i64) -> (String, String) {
    (
        format!("Limit reached for {}", item),
        format!(
            "Unfortunately only {} people can choose this option. Please pick another one.",
            limit
        ),
    )
}

/// A ticket's checklist is complete when every required item among the
/// ticket type's configured items has an answer.
pub fn is_checklist_completed(configured: &[Checklist], answered_ids: &HashSet<String>) -> bool {
    configured
        .iter()
        .filter(|c| c.is_required)
        .all(|c| answered_ids.contains(&c.id))
}

/// Per-item answer tallies: checklist id -> answer -> count.
pub type AnswerStats = BTreeMap<String, BTreeMap<String, i64>>;

/// Aggregates `(checklist_id, answer)` rows for one event.
pub fn aggregate_answer_stats<I>(rows: I) -> AnswerStats
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut stats = AnswerStats::new();
    for (checklist_id, answer) in rows {
        *stats
            .entry(checklist_id)
            .or_default()
            .entry(answer)
            .or_insert(0) += 1;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::checklist::tests::select_checklist;
    use serde_json::json;

    fn option(limit: Option<i64>) -> SelectOption {
        SelectOption {
            item: "vegan".to_string(),
            limit,
        }
    }

    #[test]
    fn test_unlimited_options() {
        assert_eq!(check_option_capacity(&option(None), 100), CapacityDecision::Unlimited);
        assert_eq!(check_option_capacity(&option(Some(0)), 100), CapacityDecision::Unlimited);
    }

    #[test]
    fn test_limited_option() {
        assert_eq!(
            check_option_capacity(&option(Some(1)), 0),
            CapacityDecision::Allowed { limit: 1, taken: 0 }
        );
        assert!(check_option_capacity(&option(Some(1)), 1).is_rejected());
        assert!(check_option_capacity(&option(Some(2)), 3).is_rejected());
    }

    #[test]
    fn test_capacity_error_text_mentions_limit() {
        let (title, message) = capacity_error_text("vegan", 20);
        assert!(title.contains("vegan"));
        assert!(message.contains("20"));
    }

    #[test]
    fn test_completion_without_items() {
        assert!(is_checklist_completed(&[], &HashSet::new()));
    }

    #[test]
    fn test_completion_without_required_items() {
        let items = vec![select_checklist("food", json!(["meat"]))];
        assert!(is_checklist_completed(&items, &HashSet::new()));
    }

    #[test]
    fn test_completion_requires_all_required_answers() {
        let mut food = select_checklist("food", json!(["meat"]));
        food.is_required = true;
        let mut shirt = select_checklist("shirt", json!(["M", "L"]));
        shirt.is_required = true;
        let optional = select_checklist("transfer", json!(["bus"]));
        let items = vec![food, shirt, optional];

        let mut answered: HashSet<String> = ["food".to_string()].into();
        assert!(!is_checklist_completed(&items, &answered));

        answered.insert("shirt".to_string());
        assert!(is_checklist_completed(&items, &answered));
    }

    #[test]
    fn test_aggregate_answer_stats() {
        let rows = vec![
            ("food".to_string(), "vegan".to_string()),
            ("food".to_string(), "meat".to_string()),
            ("food".to_string(), "vegan".to_string()),
            ("shirt".to_string(), "L".to_string()),
        ];
        let stats = aggregate_answer_stats(rows);
        assert_eq!(stats["food"]["vegan"], 2);
        assert_eq!(stats["food"]["meat"], 1);
        assert_eq!(stats["shirt"]["L"], 1);
        assert!(aggregate_answer_stats(Vec::new()).is_empty());
    }
}
