//! Application services: outbound integrations and workflows spanning
//! several repositories.

pub mod club;
pub mod email;
pub mod event_sync;
pub mod notifications;
pub mod reconciler;
pub mod stripe;
pub mod telegram;
