//! Webhook subscription types.
//!
//! Provides the subscriber registration and its creation request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::event::EventKind;
use crate::error::SdkError;

/// A webhook subscriber registration.
///
/// The secret is used only to sign payloads. It is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSubscription {
    /// Subscription ID.
    pub id: Uuid,

    /// Target URL.
    pub url: String,

    /// Token scope; `None` matches every token.
    #[serde(default)]
    pub token_address: Option<String>,

    /// Subscribed event kinds.
    pub events: Vec<EventKind>,

    /// Signing secret.
    #[serde(skip_serializing, default)]
    pub secret: String,

    /// Whether the subscription receives deliveries.
    pub active: bool,

    /// Owner identifier.
    pub owner: String,

    /// Creation time.
    pub created_at: DateTime<Utc>,

    /// Time of the last successful delivery.
    #[serde(default)]
    pub last_triggered: Option<DateTime<Utc>>,
}

impl WebhookSubscription {
    /// Creates an active subscription from a registration request.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::InvalidSubscription` if the request is invalid.
    pub fn from_request(request: NewSubscription) -> Result<Self, SdkError> {
        request.validate()?;

        Ok(Self {
            id: Uuid::new_v4(),
            url: request.url,
            token_address: request.token_address,
            events: request.events,
            secret: request.secret,
            active: true,
            owner: request.owner,
            created_at: Utc::now(),
            last_triggered: None,
        })
    }

    /// Returns true if the subscription lists the given event kind.
    #[must_use]
    pub fn subscribes_to(&self, kind: EventKind) -> bool {
        self.events.contains(&kind)
    }

    /// Returns true if the subscription is scoped to a single token.
    #[must_use]
    pub const fn is_token_scoped(&self) -> bool {
        self.token_address.is_some()
    }
}

/// A subscription registration request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubscription {
    /// Target URL.
    pub url: String,

    /// Optional token scope.
    #[serde(default)]
    pub token_address: Option<String>,

    /// Event kinds to receive.
    pub events: Vec<EventKind>,

    /// Signing secret.
    pub secret: String,

    /// Owner identifier.
    pub owner: String,
}

impl NewSubscription {
    /// Creates a request for any token.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        events: Vec<EventKind>,
        secret: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            token_address: None,
            events,
            secret: secret.into(),
            owner: owner.into(),
        }
    }

    /// Scopes the request to a single token.
    #[must_use]
    pub fn with_token(mut self, token_address: impl Into<String>) -> Self {
        self.token_address = Some(token_address.into());
        self
    }

    /// Validates the request.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::InvalidSubscription` if the URL, secret or event
    /// set is empty.
    pub fn validate(&self) -> Result<(), SdkError> {
        if self.url.trim().is_empty() {
            return Err(SdkError::InvalidSubscription("url cannot be empty".to_string()));
        }

        if self.events.is_empty() {
            return Err(SdkError::InvalidSubscription(
                "at least one event kind is required".to_string(),
            ));
        }

        if self.secret.is_empty() {
            return Err(SdkError::InvalidSubscription("secret cannot be empty".to_string()));
        }

        Ok(())
    }
}
