//! Inventory rules for ticket types and events.
//!
//! Counts passed in here are always live counts of ticket rows, read while
//! the relevant rows are locked. The cached `tickets_sold` column is only
//! ever derived from them.

/// Live availability of one ticket type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeAvailability {
    pub limit_quantity: i32,
    pub sold: i64,
    pub is_special: bool,
}

impl TypeAvailability {
    pub fn is_available(&self) -> bool {
        !is_sold_out(self.limit_quantity, self.sold)
    }
}

/// A type is sold out iff it has a limit and the live count reached it.
pub fn is_sold_out(limit_quantity: i32, sold: i64) -> bool {
    limit_quantity >= 0 && sold >= i64::from(limit_quantity)
}

/// Whether one more ticket fits under the limit.
pub fn has_capacity(limit_quantity: i32, sold: i64) -> bool {
    !is_sold_out(limit_quantity, sold)
}

/// Whether a user already holding `owned` tickets of a type may get another.
/// Non-positive limits mean unlimited.
pub fn within_per_user_limit(limit_per_user: i32, owned: i64) -> bool {
    limit_per_user <= 0 || owned < i64::from(limit_per_user)
}

/// An event is sold out when it has regular (non-special) types and none of
/// them is available. Special types never keep an event open.
pub fn is_event_sold_out(types: &[TypeAvailability]) -> bool {
    let mut regular = types.iter().filter(|t| !t.is_special).peekable();
    regular.peek().is_some() && regular.all(|t| !t.is_available())
}

/// Ledger values to store after a recount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerState {
    pub tickets_sold: i32,
    pub is_sold_out: bool,
    /// The type crossed into sold-out with this recount.
    pub became_sold_out: bool,
}

/// Derives the ledger columns of a type from its live count.
pub fn ledger_after_recount(limit_quantity: i32, was_sold_out: bool, live_count: i64) -> LedgerState {
    let sold_out = is_sold_out(limit_quantity, live_count);
    LedgerState {
        tickets_sold: i32::try_from(live_count).unwrap_or(i32::MAX),
        is_sold_out: sold_out,
        became_sold_out: sold_out && !was_sold_out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regular(limit_quantity: i32, sold: i64) -> TypeAvailability {
        TypeAvailability {
            limit_quantity,
            sold,
            is_special: false,
        }
    }

    fn special(limit_quantity: i32, sold: i64) -> TypeAvailability {
        TypeAvailability {
            limit_quantity,
            sold,
            is_special: true,
        }
    }

    #[test]
    fn test_unlimited_never_sold_out() {
        assert!(!is_sold_out(-1, 0));
        assert!(!is_sold_out(-1, 1_000_000));
        assert!(has_capacity(-1, 1_000_000));
    }

    #[test]
    fn test_sold_out_at_limit() {
        assert!(!is_sold_out(3, 2));
        assert!(is_sold_out(3, 3));
        assert!(is_sold_out(3, 4));
    }

    #[test]
    fn test_zero_limit_is_sold_out_immediately() {
        assert!(is_sold_out(0, 0));
        assert!(!has_capacity(0, 0));
    }

    #[test]
    fn test_per_user_limit() {
        assert!(within_per_user_limit(-1, 50));
        assert!(within_per_user_limit(0, 50));
        assert!(within_per_user_limit(1, 0));
        assert!(!within_per_user_limit(1, 1));
        assert!(within_per_user_limit(2, 1));
    }

    #[test]
    fn test_event_sold_out_when_all_regular_types_gone() {
        assert!(is_event_sold_out(&[regular(2, 2), regular(1, 1)]));
        assert!(!is_event_sold_out(&[regular(2, 2), regular(1, 0)]));
        assert!(!is_event_sold_out(&[regular(2, 2), regular(-1, 10)]));
    }

    #[test]
    fn test_event_ignores_special_types() {
        assert!(is_event_sold_out(&[regular(1, 1), special(-1, 0)]));
        assert!(is_event_sold_out(&[regular(1, 1), special(10, 0)]));
    }

    #[test]
    fn test_event_with_only_special_types_is_not_sold_out() {
        assert!(!is_event_sold_out(&[special(1, 1)]));
        assert!(!is_event_sold_out(&[]));
    }

    #[test]
    fn test_ledger_transition() {
        let first = ledger_after_recount(2, false, 1);
        assert_eq!(
            first,
            LedgerState {
                tickets_sold: 1,
                is_sold_out: false,
                became_sold_out: false
            }
        );

        let second = ledger_after_recount(2, false, 2);
        assert!(second.is_sold_out);
        assert!(second.became_sold_out);

        let again = ledger_after_recount(2, true, 2);
        assert!(again.is_sold_out);
        assert!(!again.became_sold_out);
    }

    #[test]
    fn test_ledger_reopens_after_revocation() {
        let state = ledger_after_recount(2, true, 1);
        assert!(!state.is_sold_out);
        assert!(!state.became_sold_out);
        assert_eq!(state.tickets_sold, 1);
    }
}
