//! Launchpad SDK - shared types for the webhook event pipeline.
//!
//! This crate holds the data model exchanged between the event indexer and
//! the webhook dispatcher, plus the payload signer that receivers use to
//! verify deliveries.
//!
//! # Core Types
//!
//! - [`EventKind`]: Webhook event kinds
//! - [`RawEvent`]: An event record as returned by the chain event API
//! - [`DomainEvent`]: A classified token-factory event
//! - [`Amount`]: Token amount serialized as a decimal string
//!
//! # Webhook Types
//!
//! - [`WebhookSubscription`]: Subscriber registration
//! - [`WebhookPayload`]: Signed wire payload
//! - [`DeliveryLog`]: Audit record of one delivery sequence
//!
//! # Example
//!
//! ```rust
//! use launchpad_sdk::{signing, EventKind};
//! use serde_json::json;
//!
//! let data = json!({"tokenAddress": "CTOKEN"});
//! let timestamp = "2024-01-01T00:00:00.000Z";
//! let signature = signing::sign(EventKind::TokenCreated, timestamp, &data, "s3cr3t")?;
//! assert!(signing::verify(EventKind::TokenCreated, timestamp, &data, "s3cr3t", &signature));
//! # Ok::<(), launchpad_sdk::SdkError>(())
//! ```

pub mod error;
pub mod signing;
pub mod types;

pub use error::SdkError;
pub use types::{
    Amount, BurnEvent, DeliveryLog, DomainEvent, EventKind, MetadataUpdatedEvent, NewDeliveryLog,
    NewSubscription, RawEvent, TokenCreatedEvent, WebhookPayload, WebhookSubscription,
};
