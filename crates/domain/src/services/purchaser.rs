//! Resolving who paid for a checkout session.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

use crate::models::{CheckoutSession, User};

pub const METADATA_USER_ID: &str = "user_id";
pub const METADATA_USER_SLUG: &str = "user_slug";

/// How the purchaser of a session is identified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PurchaserResolution {
    /// Session metadata carries `user_id` or `user_slug`; guests fall back
    /// to the session e-mail.
    #[default]
    Metadata,
    /// The session's customer e-mail identifies the member.
    Email,
}

impl PurchaserResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaserResolution::Metadata => "metadata",
            PurchaserResolution::Email => "email",
        }
    }
}

impl FromStr for PurchaserResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "metadata" => Ok(PurchaserResolution::Metadata),
            "email" => Ok(PurchaserResolution::Email),
            _ => Err(format!("Invalid purchaser resolution: {}", s)),
        }
    }
}

impl fmt::Display for PurchaserResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors identifying a purchaser.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PurchaserError {
    #[error("Session metadata user_id is not a valid id: {0}")]
    InvalidUserId(String),

    #[error("Session has no customer e-mail")]
    MissingEmail,

    #[error("Session identifies neither a member nor an e-mail")]
    Unidentifiable,
}

/// Which member record to look up for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaserLookup {
    /// Match by id, falling back to the slug when the id finds nobody.
    Member {
        id: Option<Uuid>,
        slug: Option<String>,
    },
    ByEmail(String),
    Guest,
}

/// Derives the member lookup for `session` under `strategy`.
pub fn purchaser_lookup(
    strategy: PurchaserResolution,
    session: &CheckoutSession,
) -> Result<PurchaserLookup, PurchaserError> {
    match strategy {
        PurchaserResolution::Metadata => {
            let slug = session
                .metadata_value(METADATA_USER_SLUG)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            let id = match session.metadata_value(METADATA_USER_ID) {
                Some(raw) => match Uuid::parse_str(raw) {
                    Ok(id) => Some(id),
                    Err(_) if slug.is_some() => None,
                    Err(_) => return Err(PurchaserError::InvalidUserId(raw.to_string())),
                },
                None => None,
            };
            if id.is_none() && slug.is_none() {
                return Ok(PurchaserLookup::Guest);
            }
            Ok(PurchaserLookup::Member { id, slug })
        }
        PurchaserResolution::Email => session
            .customer_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(|e| PurchaserLookup::ByEmail(e.to_lowercase()))
            .ok_or(PurchaserError::MissingEmail),
    }
}

/// E-mail recorded on the tickets: the member's, else the session's.
pub fn ticket_email(
    user: Option<&User>,
    session: &CheckoutSession,
) -> Result<String, PurchaserError> {
    user.map(|u| u.email.clone())
        .or_else(|| {
            session
                .customer_email
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
        })
        .ok_or(PurchaserError::Unidentifiable)
}
