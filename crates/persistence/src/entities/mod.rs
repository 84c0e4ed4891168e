//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod checklist;
pub mod event;
pub mod processed_session;
pub mod subscription;
pub mod ticket;
pub mod ticket_type;
pub mod user;

pub use checklist::{ChecklistAnswerEntity, ChecklistEntity};
pub use event::EventEntity;
pub use processed_session::ProcessedSessionEntity;
pub use subscription::{AnnouncementRecipientEntity, EventSubscriptionEntity};
pub use ticket::{HeldTicketEntity, TicketEntity};
pub use ticket_type::TicketTypeEntity;
pub use user::UserEntity;
