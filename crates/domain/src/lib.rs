//! Domain layer for the events backend.
//!
//! This crate contains:
//! - Domain models (Event, TicketType, Ticket, Checklist, User, payment events)
//! - Pure business rules for inventory, checklists and purchaser resolution
//! - Collaborator traits for payment processing and notifications

pub mod models;
pub mod services;
