//! Event polling module for the Launchpad indexer.
//!
//! This module turns the chain event log into a stream of dispatched
//! domain events.
//!
//! # Components
//!
//! - [`classifier`]: Pure mapping from raw events to domain events
//! - [`cursor`]: EventCursor for tracking polling progress
//! - [`poller`]: EventPoller run/stop loop
//! - [`metrics`]: Poller metrics
//! - [`types`]: PollSummary type

pub mod classifier;
pub mod cursor;
pub mod metrics;
pub mod poller;
pub mod types;

pub use classifier::classify;
pub use cursor::EventCursor;
pub use metrics::PollerMetrics;
pub use poller::{EventDispatcher, EventPoller, PollerConfig};
pub use types::PollSummary;
