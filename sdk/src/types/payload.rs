//! Webhook payload type.
//!
//! Provides the signed JSON object POSTed to subscribers.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::event::EventKind;
use crate::error::SdkError;
use crate::signing;

/// The JSON body of a webhook delivery.
///
/// Built once per delivery; retries resend the same object, so the signature
/// does not change between attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Event kind.
    pub event: EventKind,

    /// ISO-8601 UTC timestamp with millisecond precision.
    pub timestamp: String,

    /// Event data.
    pub data: Value,

    /// Hex HMAC-SHA256 over `{event, timestamp, data}`.
    pub signature: String,
}

impl WebhookPayload {
    /// Builds and signs a payload stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::Signing` if the payload cannot be signed.
    pub fn new(event: EventKind, data: Value, secret: &str) -> Result<Self, SdkError> {
        Self::at(event, Utc::now(), data, secret)
    }

    /// Builds and signs a payload stamped with the given time.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::Signing` if the payload cannot be signed.
    pub fn at(
        event: EventKind,
        time: DateTime<Utc>,
        data: Value,
        secret: &str,
    ) -> Result<Self, SdkError> {
        let timestamp = time.to_rfc3339_opts(SecondsFormat::Millis, true);
        let signature = signing::sign(event, &timestamp, &data, secret)?;

        Ok(Self {
            event,
            timestamp,
            data,
            signature,
        })
    }

    /// Builds a payload with an empty signature.
    ///
    /// Used for the delivery log when signing fails; it is never sent.
    #[must_use]
    pub fn unsigned(event: EventKind, time: DateTime<Utc>, data: Value) -> Self {
        Self {
            event,
            timestamp: time.to_rfc3339_opts(SecondsFormat::Millis, true),
            data,
            signature: String::new(),
        }
    }

    /// Returns the canonical JSON the signature covers.
    #[must_use]
    pub fn signed_content(&self) -> String {
        signing::canonical_json(self.event, &self.timestamp, &self.data)
    }

    /// Returns true if the signature matches the given secret.
    #[must_use]
    pub fn verify(&self, secret: &str) -> bool {
        signing::verify(
            self.event,
            &self.timestamp,
            &self.data,
            secret,
            &self.signature,
        )
    }
}
