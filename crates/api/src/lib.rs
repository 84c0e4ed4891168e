//! Event ticketing API: payment webhooks, ticket issuance, holder checklists
//! and announcements.

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod jobs;
pub mod middleware;
pub mod routes;
pub mod services;
