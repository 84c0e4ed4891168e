//! Keyed hashing helpers.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn keyed(secret: &[u8], message: &[u8]) -> HmacSha256 {
    // HMAC accepts keys of any length, so construction cannot fail.
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any length"),
    };
    mac.update(message);
    mac
}

/// Computes HMAC-SHA256 of `message` keyed with `secret`, hex encoded.
pub fn hmac_sha256_hex(secret: &[u8], message: &[u8]) -> String {
    hex::encode(keyed(secret, message).finalize().into_bytes())
}

/// Checks a hex encoded HMAC-SHA256 tag in constant time.
///
/// Returns false for tags that are not valid hex.
pub fn verify_hmac_sha256_hex(secret: &[u8], message: &[u8], tag_hex: &str) -> bool {
    match hex::decode(tag_hex) {
        Ok(tag) => keyed(secret, message).verify_slice(&tag).is_ok(),
        Err(_) => false,
    }
}
