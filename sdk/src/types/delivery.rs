//! Delivery log types.
//!
//! Provides the audit record written once per delivery sequence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::event::EventKind;
use super::payload::WebhookPayload;

/// Outcome of a full delivery sequence to one subscription, as handed to the
/// subscription store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeliveryLog {
    /// Subscription the payload was sent to.
    pub subscription_id: Uuid,
    /// Event kind.
    pub event: EventKind,
    /// Payload snapshot.
    pub payload: WebhookPayload,
    /// Last HTTP status, `None` if no response was ever received.
    pub status_code: Option<u16>,
    /// Whether the delivery succeeded.
    pub success: bool,
    /// Attempts made.
    pub attempts: u32,
    /// Time of the last attempt.
    pub last_attempt_at: DateTime<Utc>,
    /// Last error message, `None` on success.
    pub error_message: Option<String>,
}

/// A stored delivery log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryLog {
    /// Log entry ID.
    pub id: Uuid,
    /// Subscription the payload was sent to.
    pub subscription_id: Uuid,
    /// Event kind.
    pub event: EventKind,
    /// Payload snapshot.
    pub payload: WebhookPayload,
    /// Last HTTP status, `None` if no response was ever received.
    pub status_code: Option<u16>,
    /// Whether the delivery succeeded.
    pub success: bool,
    /// Attempts made.
    pub attempts: u32,
    /// Time of the last attempt.
    pub last_attempt_at: DateTime<Utc>,
    /// Last error message, `None` on success.
    pub error_message: Option<String>,
}

impl DeliveryLog {
    /// Assigns an ID to a new log entry.
    #[must_use]
    pub fn from_new(entry: NewDeliveryLog) -> Self {
        Self {
            id: Uuid::new_v4(),
            subscription_id: entry.subscription_id,
            event: entry.event,
            payload: entry.payload,
            status_code: entry.status_code,
            success: entry.success,
            attempts: entry.attempts,
            last_attempt_at: entry.last_attempt_at,
            error_message: entry.error_message,
        }
    }

    /// Returns true if the delivery exhausted its attempts without success.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        !self.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_new_keeps_fields() {
        let payload =
            WebhookPayload::new(EventKind::BurnSelf, json!({}), "k").expect("payload");
        let entry = NewDeliveryLog {
            subscription_id: Uuid::new_v4(),
            event: EventKind::BurnSelf,
            payload,
            status_code: Some(503),
            success: false,
            attempts: 3,
            last_attempt_at: Utc::now(),
            error_message: Some("HTTP 503".to_string()),
        };

        let log = DeliveryLog::from_new(entry.clone());
        assert_eq!(log.subscription_id, entry.subscription_id);
        assert_eq!(log.attempts, 3);
        assert_eq!(log.status_code, Some(503));
        assert!(log.is_failure());
    }
}
