//! Persistence layer for the events backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations, including the transactional ticket issuer
//! - Query and connection pool metrics

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
