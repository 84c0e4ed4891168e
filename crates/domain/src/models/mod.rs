//! Domain models for the events backend.

pub mod checklist;
pub mod event;
pub mod payment;
pub mod subscription;
pub mod ticket;
pub mod ticket_type;
pub mod user;

pub use checklist::{Checklist, ChecklistAnswer, ChecklistKind, SelectOption, SubmitAnswerRequest};
pub use event::Event;
pub use payment::{CheckoutSession, LineItem, PaymentEvent};
pub use subscription::{AnnouncementRecipient, EventSubscription, SubscriptionTopic};
pub use ticket::{Ticket, TicketMetadata, TicketResponse};
pub use ticket_type::{TicketType, TicketTypeResponse};
pub use user::{ParticipantResponse, User, UserProfile};
