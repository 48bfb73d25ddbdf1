//! Core types for the Launchpad SDK.
//!
//! This module provides the event and webhook types shared by the indexer
//! and the dispatcher.

pub mod delivery;
pub mod event;
pub mod payload;
pub mod primitives;
pub mod subscription;

pub use delivery::{DeliveryLog, NewDeliveryLog};
pub use event::{
    BurnEvent, DomainEvent, EventKind, MetadataUpdatedEvent, RawEvent, TokenCreatedEvent,
};
pub use payload::WebhookPayload;
pub use primitives::Amount;
pub use subscription::{NewSubscription, WebhookSubscription};
