//! Shared utilities and common types for the events backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Keyed hashing (HMAC-SHA256)
//! - Payment webhook signature verification
//! - JWT access token validation
//! - Common validation logic
//! - HTML escaping for outbound messages

pub mod crypto;
pub mod jwt;
pub mod markup;
pub mod signature;
pub mod validation;
