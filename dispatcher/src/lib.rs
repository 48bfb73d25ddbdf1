//! Launchpad Dispatcher - Webhook delivery for token factory events.
//!
//! This crate matches classified factory events against webhook
//! subscriptions and delivers HMAC-signed JSON payloads to every match, with
//! bounded retries and one delivery log per subscription and event.
//!
//! # Components
//!
//! - [`config`]: Dispatcher configuration
//! - [`matcher`]: Subscription eligibility
//! - [`store`]: Subscription and delivery log storage
//! - [`sender`]: Per-subscription HTTP delivery with retries
//! - [`sleeper`]: Backoff sleeping
//! - [`engine`]: Fan-out delivery engine
//! - [`metrics`]: Delivery metrics

pub mod config;
pub mod engine;
pub mod matcher;
pub mod metrics;
pub mod sender;
pub mod sleeper;
pub mod store;

pub use config::{ConfigError, DispatcherConfig};
pub use engine::{DeliveryEngine, TriggerReport, DEFAULT_MAX_CONCURRENT_DELIVERIES};
pub use matcher::{find_matching, is_eligible};
pub use metrics::{DeliveryMetrics, DeliveryMetricsSnapshot};
pub use sender::{DeliveryConfig, SenderError, WebhookSender};
pub use sleeper::{RecordingSleeper, Sleeper, TokioSleeper};
pub use store::{
    InMemorySubscriptionStore, StoreError, SubscriptionStore, DEFAULT_LOG_RETENTION,
};
