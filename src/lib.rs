//! # Launchpad
//!
//! Webhook event pipeline for the Launchpad token factory.
//!
//! The workspace is split into three crates, re-exported here:
//!
//! - [`sdk`]: shared event, subscription, and payload types plus HMAC signing
//! - [`indexer`]: event source client, classifier, and the cursor-driven poller
//! - [`dispatcher`]: subscription matching and webhook delivery
//!
//! A subscriber verifies a delivery by recomputing the signature over the
//! payload's `event`, `timestamp`, and `data` fields:
//!
//! ```
//! use launchpad::sdk::{EventKind, WebhookPayload};
//! use serde_json::json;
//!
//! let payload = WebhookPayload::new(EventKind::BurnSelf, json!({"amount": "10"}), "secret")?;
//! assert!(payload.verify("secret"));
//! # Ok::<(), launchpad::sdk::SdkError>(())
//! ```

pub use launchpad_dispatcher as dispatcher;
pub use launchpad_indexer as indexer;
pub use launchpad_sdk as sdk;
