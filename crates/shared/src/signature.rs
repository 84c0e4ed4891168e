//! Payment webhook signature verification.
//!
//! The processor signs each delivery with the endpoint secret and sends
//! `Stripe-Signature: t=<unix seconds>,v1=<hex>[,v1=<hex>...]`. The signed
//! message is `"{t}.{raw body}"` under HMAC-SHA256. Several `v1` entries may
//! be present while a secret is being rolled.

use thiserror::Error;

use crate::crypto::{hmac_sha256_hex, verify_hmac_sha256_hex};

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Default tolerance between the signed timestamp and the local clock.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

const TIMESTAMP_KEY: &str = "t";
const SIGNATURE_SCHEME: &str = "v1";

/// Errors raised while verifying a webhook signature.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Missing signature header")]
    MissingHeader,

    #[error("Malformed signature header")]
    MalformedHeader,

    #[error("No signature matches the payload")]
    Mismatch,

    #[error("Signature timestamp outside tolerance")]
    TimestampOutOfTolerance,
}

/// Parsed form of the signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<String>,
}

/// Parses `t=...,v1=...` into its timestamp and candidate signatures.
pub fn parse_signature_header(header: &str) -> Result<SignatureHeader, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            TIMESTAMP_KEY => {
                let parsed = value
                    .parse::<i64>()
                    .map_err(|_| SignatureError::MalformedHeader)?;
                timestamp = Some(parsed);
            }
            SIGNATURE_SCHEME => signatures.push(value.to_ascii_lowercase()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
    if signatures.is_empty() {
        return Err(SignatureError::MalformedHeader);
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

/// Computes the hex signature for `payload` signed at `timestamp`.
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    hmac_sha256_hex(secret.as_bytes(), &signed_message(timestamp, payload))
}

fn signed_message(timestamp: i64, payload: &[u8]) -> Vec<u8> {
    let mut message = format!("{}.", timestamp).into_bytes();
    message.extend_from_slice(payload);
    message
}

/// Builds a complete signature header value, as the processor would send it.
pub fn build_signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    format!(
        "{}={},{}={}",
        TIMESTAMP_KEY,
        timestamp,
        SIGNATURE_SCHEME,
        compute_signature(secret, timestamp, payload)
    )
}

/// Verifies the raw payload against the signature header.
///
/// `now` is the local unix time in seconds. A tolerance of zero disables the
/// timestamp check.
pub fn verify_signature(
    payload: &[u8],
    header: Option<&str>,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), SignatureError> {
    let header = header
        .filter(|h| !h.is_empty())
        .ok_or(SignatureError::MissingHeader)?;
    let parsed = parse_signature_header(header)?;

    let message = signed_message(parsed.timestamp, payload);
    let matched = parsed
        .signatures
        .iter()
        .any(|candidate| verify_hmac_sha256_hex(secret.as_bytes(), &message, candidate));
    if !matched {
        return Err(SignatureError::Mismatch);
    }

    if tolerance_secs > 0 && (now - parsed.timestamp).abs() > tolerance_secs {
        return Err(SignatureError::TimestampOutOfTolerance);
    }

    Ok(())
}
