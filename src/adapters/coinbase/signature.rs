//! `X-CC-Webhook-Signature` verification.
//!
//! The processor signs the exact request bytes with HMAC-SHA256 under the
//! account's shared secret and sends the lowercase hex digest. Hashing a
//! re-serialized body would not reproduce the digest, so callers must pass
//! the body as received.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-CC-Webhook-Signature";

/// Hex HMAC-SHA256 of `body` under `secret`.
pub fn sign(body: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of `signature` (hex) against the HMAC of `body`.
pub fn verify(body: &[u8], signature: &str, secret: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}
