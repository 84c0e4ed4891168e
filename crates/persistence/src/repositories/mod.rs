//! Repository implementations.

pub mod checklist;
pub mod checklist_answer;
pub mod event;
pub mod issuance;
pub mod ledger;
pub mod processed_session;
pub mod subscription;
pub mod ticket;
pub mod ticket_type;
pub mod user;

pub use checklist::ChecklistRepository;
pub use checklist_answer::{
    AnswerOutcome, AnswerSubmission, ChecklistAnswerRepository, ChecklistError,
};
pub use event::{EventRepository, NewEvent};
pub use issuance::{IssueError, IssueRequest, IssuedTicket, TicketIssuer};
pub use ledger::{InventoryLedger, LedgerOutcome};
pub use processed_session::ProcessedSessionRepository;
pub use subscription::SubscriptionRepository;
pub use ticket::TicketRepository;
pub use ticket_type::{InventorySnapshot, NewTicketType, TicketTypeRepository};
pub use user::UserRepository;
