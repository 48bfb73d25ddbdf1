//! Chain event sources.
//!
//! The poller reads events through the [`EventSource`] trait. The
//! [`HttpEventSource`] implementation talks to the paginated event API.
//!
//! # Components
//!
//! - [`config`]: Event API client configuration
//! - [`error`]: Source error types
//! - [`http`]: HTTP event API client

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod http;

use async_trait::async_trait;
use launchpad_sdk::RawEvent;
use serde::{Deserialize, Serialize};

pub use config::SourceConfig;
pub use error::SourceError;
pub use http::HttpEventSource;

/// A page request against the event API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    /// Paging token to continue after; `None` on the first fetch.
    pub cursor: Option<String>,

    /// Ledger to start from when there is no cursor.
    pub start_ledger: Option<u64>,

    /// Maximum number of events to return.
    pub limit: u32,
}

impl EventQuery {
    /// Creates a query for the first page.
    #[must_use]
    pub const fn first(start_ledger: Option<u64>, limit: u32) -> Self {
        Self {
            cursor: None,
            start_ledger,
            limit,
        }
    }

    /// Creates a query continuing after the given paging token.
    #[must_use]
    pub fn after(cursor: impl Into<String>, limit: u32) -> Self {
        Self {
            cursor: Some(cursor.into()),
            start_ledger: None,
            limit,
        }
    }
}

/// A page of events in ascending ledger order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPage {
    /// Events, oldest first.
    #[serde(default)]
    pub events: Vec<RawEvent>,

    /// Latest ledger known to the event API.
    #[serde(default, alias = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

/// Source of raw chain events.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetches the next page of events.
    ///
    /// # Errors
    ///
    /// Returns a `SourceError` if the event API is unreachable or replies
    /// with an error or a malformed body.
    async fn fetch_events(&self, query: &EventQuery) -> Result<EventPage, SourceError>;
}

#[async_trait]
impl<T: EventSource + ?Sized> EventSource for Arc<T> {
    async fn fetch_events(&self, query: &EventQuery) -> Result<EventPage, SourceError> {
        (**self).fetch_events(query).await
    }
}
