//! Launchpad Indexer - chain event poller for the webhook pipeline.
//!
//! This crate polls the chain event API, classifies raw events into
//! token-factory domain events, and hands them to a dispatcher.
//!
//! # Components
//!
//! - [`events`]: Classifier, cursor, poller and poller metrics
//! - [`source`]: Event source trait and HTTP event API client

pub mod events;
pub mod source;

pub use events::{
    classify, EventCursor, EventDispatcher, EventPoller, PollSummary, PollerConfig, PollerMetrics,
};
pub use source::{EventPage, EventQuery, EventSource, HttpEventSource, SourceConfig, SourceError};
