//! Event types for the Launchpad SDK.
//!
//! Provides the raw event record returned by the chain event API and the
//! classified token-factory events delivered to webhook subscribers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::primitives::Amount;
use crate::error::SdkError;

/// Kind of a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// Holder burned their own tokens.
    BurnSelf,
    /// Admin burned tokens from a holder.
    BurnAdmin,
    /// A new token was created by the factory.
    TokenCreated,
    /// Token metadata was set or updated.
    MetadataUpdated,
}

impl EventKind {
    /// All event kinds, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::BurnSelf,
        Self::BurnAdmin,
        Self::TokenCreated,
        Self::MetadataUpdated,
    ];

    /// Returns the wire name used in payloads and the `X-Webhook-Event` header.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BurnSelf => "BURN_SELF",
            Self::BurnAdmin => "BURN_ADMIN",
            Self::TokenCreated => "TOKEN_CREATED",
            Self::MetadataUpdated => "METADATA_UPDATED",
        }
    }

    /// Returns true for either burn kind.
    #[must_use]
    pub const fn is_burn(&self) -> bool {
        matches!(self, Self::BurnSelf | Self::BurnAdmin)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SdkError::UnknownEventKind(s.to_string()))
    }
}

/// An event record as returned by the chain event API.
///
/// `topic` and `value` are decoded native values: the first topic entry is
/// the event name, the remaining entries are qualifiers such as the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    /// Event ID.
    #[serde(default)]
    pub id: String,

    /// Opaque pagination token, usable as the next cursor.
    #[serde(alias = "paging_token")]
    pub paging_token: String,

    /// Ledger sequence the event was emitted in.
    #[serde(default)]
    pub ledger: u64,

    /// Ledger close time, if reported.
    #[serde(default, alias = "ledger_closed_at", skip_serializing_if = "Option::is_none")]
    pub ledger_closed_at: Option<String>,

    /// Emitting contract ID.
    #[serde(default, alias = "contract_id")]
    pub contract_id: String,

    /// Transaction hash.
    #[serde(default, alias = "tx_hash")]
    pub tx_hash: String,

    /// Topic array (event name plus qualifiers).
    #[serde(default)]
    pub topic: Vec<Value>,

    /// Event value blob.
    #[serde(default)]
    pub value: Value,
}

impl RawEvent {
    /// Returns the event name from the first topic entry.
    ///
    /// Accepts a plain string or a `{"symbol": "..."}` object.
    #[must_use]
    pub fn topic_name(&self) -> Option<&str> {
        let first = self.topic.first()?;
        first
            .as_str()
            .or_else(|| first.get("symbol").and_then(Value::as_str))
    }
}

/// A burn of token supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnEvent {
    /// Token contract address.
    pub token_address: String,
    /// Transaction hash.
    pub tx_hash: String,
    /// Ledger sequence.
    pub ledger: u64,
    /// Holder whose balance was burned.
    pub from: String,
    /// Amount burned.
    pub amount: Amount,
    /// Account that performed the burn.
    pub burner: String,
    /// Factory index of the token, when the contract names it by index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_index: Option<u32>,
}

/// Creation of a new token by the factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCreatedEvent {
    /// Token contract address.
    pub token_address: String,
    /// Transaction hash.
    pub tx_hash: String,
    /// Ledger sequence.
    pub ledger: u64,
    /// Creator address.
    pub creator: String,
    /// Token name.
    pub name: String,
    /// Token symbol.
    pub symbol: String,
    /// Decimal places.
    pub decimals: u32,
    /// Initial supply.
    pub initial_supply: Amount,
}

/// Update of a token's metadata URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataUpdatedEvent {
    /// Token contract address.
    pub token_address: String,
    /// Transaction hash.
    pub tx_hash: String,
    /// Ledger sequence.
    pub ledger: u64,
    /// New metadata URI.
    pub metadata_uri: String,
    /// Account that updated the metadata.
    pub updated_by: String,
}

/// A classified token-factory event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainEvent {
    /// Holder burned their own tokens.
    BurnSelf(BurnEvent),
    /// Admin burned tokens from a holder.
    BurnAdmin(BurnEvent),
    /// A token was created.
    TokenCreated(TokenCreatedEvent),
    /// Token metadata was updated.
    MetadataUpdated(MetadataUpdatedEvent),
}

impl DomainEvent {
    /// Returns the event kind.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::BurnSelf(_) => EventKind::BurnSelf,
            Self::BurnAdmin(_) => EventKind::BurnAdmin,
            Self::TokenCreated(_) => EventKind::TokenCreated,
            Self::MetadataUpdated(_) => EventKind::MetadataUpdated,
        }
    }

    /// Returns the token address.
    #[must_use]
    pub fn token_address(&self) -> &str {
        match self {
            Self::BurnSelf(e) | Self::BurnAdmin(e) => &e.token_address,
            Self::TokenCreated(e) => &e.token_address,
            Self::MetadataUpdated(e) => &e.token_address,
        }
    }

    /// Returns the transaction hash.
    #[must_use]
    pub fn tx_hash(&self) -> &str {
        match self {
            Self::BurnSelf(e) | Self::BurnAdmin(e) => &e.tx_hash,
            Self::TokenCreated(e) => &e.tx_hash,
            Self::MetadataUpdated(e) => &e.tx_hash,
        }
    }

    /// Returns the ledger sequence.
    #[must_use]
    pub const fn ledger(&self) -> u64 {
        match self {
            Self::BurnSelf(e) | Self::BurnAdmin(e) => e.ledger,
            Self::TokenCreated(e) => e.ledger,
            Self::MetadataUpdated(e) => e.ledger,
        }
    }

    /// Returns the kind-specific fields as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::Serialization` if the event cannot be serialized.
    pub fn data(&self) -> Result<Value, SdkError> {
        let value = match self {
            Self::BurnSelf(e) | Self::BurnAdmin(e) => serde_json::to_value(e),
            Self::TokenCreated(e) => serde_json::to_value(e),
            Self::MetadataUpdated(e) => serde_json::to_value(e),
        };
        value.map_err(|e| SdkError::Serialization(e.to_string()))
    }
}
