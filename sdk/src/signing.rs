//! HMAC-SHA256 signing of webhook payloads.
//!
//! The signature covers the canonical JSON form of `{event, timestamp, data}`:
//!
//! - keys appear in the fixed order `event`, `timestamp`, `data`
//! - object keys nested inside `data` are sorted lexicographically
//! - no insignificant whitespace
//!
//! The signature is the lowercase hex encoding of
//! `HMAC-SHA256(secret, canonical_json)` and is sent in the
//! `X-Webhook-Signature` header. Receivers recompute it from the body they
//! received and compare with [`verify`], which runs in constant time.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

use crate::error::SdkError;
use crate::types::EventKind;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex signature.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Header carrying the event kind.
pub const EVENT_HEADER: &str = "X-Webhook-Event";

/// Returns the canonical JSON string that is signed.
#[must_use]
pub fn canonical_json(event: EventKind, timestamp: &str, data: &Value) -> String {
    let event = Value::from(event.as_str());
    let timestamp = Value::from(timestamp);
    format!("{{\"event\":{event},\"timestamp\":{timestamp},\"data\":{data}}}")
}

/// Signs `{event, timestamp, data}` with the subscriber secret.
///
/// # Errors
///
/// Returns `SdkError::Signing` if the HMAC cannot be keyed.
pub fn sign(
    event: EventKind,
    timestamp: &str,
    data: &Value,
    secret: &str,
) -> Result<String, SdkError> {
    sign_message(canonical_json(event, timestamp, data).as_bytes(), secret)
}

/// Signs an arbitrary message with the subscriber secret.
///
/// # Errors
///
/// Returns `SdkError::Signing` if the HMAC cannot be keyed.
pub fn sign_message(message: &[u8], secret: &str) -> Result<String, SdkError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| SdkError::Signing(e.to_string()))?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a hex signature over `{event, timestamp, data}`.
///
/// Returns `false` for malformed hex as well as for mismatches.
#[must_use]
pub fn verify(
    event: EventKind,
    timestamp: &str,
    data: &Value,
    secret: &str,
    signature: &str,
) -> bool {
    verify_message(canonical_json(event, timestamp, data).as_bytes(), secret, signature)
}

/// Verifies a hex signature over an arbitrary message in constant time.
#[must_use]
pub fn verify_message(message: &[u8], secret: &str, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(message);
    mac.verify_slice(&expected).is_ok()
}
