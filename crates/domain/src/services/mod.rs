//! Domain services for the events backend.
//!
//! Services contain business logic that operates on domain models.

pub mod checklist;
pub mod inventory;
pub mod notification;
pub mod payment;
pub mod purchaser;

pub use checklist::{
    aggregate_answer_stats, capacity_error_text, check_option_capacity, is_checklist_completed,
    AnswerStats, CapacityDecision,
};
pub use inventory::{
    has_capacity, is_event_sold_out, is_sold_out, ledger_after_recount, within_per_user_limit,
    LedgerState, TypeAvailability,
};
pub use notification::{
    ChannelOutcome, DeliveryReport, MockNotificationService, NotificationRequest,
    NotificationService,
};
pub use payment::{MockPaymentProvider, PaymentProvider, PaymentProviderError};
pub use purchaser::{
    purchaser_lookup, ticket_email, PurchaserError, PurchaserLookup, PurchaserResolution,
};
