//! Event poller.
//!
//! Owns the cursor and the run/stop lifecycle. Each cycle fetches the next
//! page of events, classifies them in order, hands recognized events to the
//! dispatcher and moves the cursor past every event, recognized or not.
//!
//! Only one poller may run against a given event stream. Two pollers would
//! each dispatch every event.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use launchpad_sdk::DomainEvent;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::classifier::classify;
use super::cursor::EventCursor;
use super::metrics::PollerMetrics;
use super::types::PollSummary;
use crate::source::{EventQuery, EventSource, SourceError};

/// Receiver of classified events.
pub trait EventDispatcher: Send + Sync {
    /// Starts delivery of an event.
    ///
    /// Must return without waiting for delivery to finish; the poller moves
    /// its cursor as soon as this returns.
    fn dispatch(&self, event: DomainEvent);
}

impl<T: EventDispatcher + ?Sized> EventDispatcher for Arc<T> {
    fn dispatch(&self, event: DomainEvent) {
        (**self).dispatch(event);
    }
}

/// Configuration for the event poller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Sleep between polls when no events are returned, in milliseconds.
    pub poll_interval_ms: u64,

    /// Maximum events per fetch.
    pub page_size: u32,

    /// Ledger to start from while the cursor is empty.
    pub start_ledger: Option<u64>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5_000,
            page_size: 100,
            start_ledger: None,
        }
    }
}

impl PollerConfig {
    /// Sets the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Sets the page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the start ledger.
    #[must_use]
    pub fn with_start_ledger(mut self, ledger: u64) -> Self {
        self.start_ledger = Some(ledger);
        self
    }

    /// Returns the poll interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Polls the event source and dispatches classified events.
pub struct EventPoller<S, D> {
    /// Configuration.
    config: PollerConfig,

    /// Event source.
    source: S,

    /// Event dispatcher.
    dispatcher: D,

    /// In-memory cursor.
    cursor: RwLock<EventCursor>,

    /// Metrics.
    metrics: Arc<PollerMetrics>,

    /// Whether the poller is running.
    running: AtomicBool,
}

impl<S: EventSource, D: EventDispatcher> EventPoller<S, D> {
    /// Creates a stopped poller with an empty cursor.
    #[must_use]
    pub fn new(config: PollerConfig, source: S, dispatcher: D) -> Self {
        Self::with_cursor(config, source, dispatcher, EventCursor::new())
    }

    /// Creates a stopped poller resuming from the given cursor.
    #[must_use]
    pub fn with_cursor(config: PollerConfig, source: S, dispatcher: D, cursor: EventCursor) -> Self {
        Self {
            config,
            source,
            dispatcher,
            cursor: RwLock::new(cursor),
            metrics: Arc::new(PollerMetrics::new()),
            running: AtomicBool::new(false),
        }
    }

    /// Returns the metrics.
    #[must_use]
    pub fn metrics(&self) -> Arc<PollerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Returns a snapshot of the cursor.
    pub async fn cursor(&self) -> EventCursor {
        self.cursor.read().await.clone()
    }

    /// Returns true if the poller is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stops the poller.
    ///
    /// Takes effect at the next loop boundary. An in-flight fetch or
    /// dispatch is not interrupted.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        info!("Event poller stop requested");
    }

    /// Runs the poll loop until stopped.
    ///
    /// Returns immediately if the poller is already running. Poll errors are
    /// logged and retried on the next tick; they never end the loop.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Event poller already running");
            return;
        }

        let interval = self.config.poll_interval();
        info!(
            poll_interval_ms = self.config.poll_interval_ms,
            page_size = self.config.page_size,
            "Event poller started"
        );

        while self.is_running() {
            match self.poll_once().await {
                // Drain the backlog without sleeping while the cursor moves.
                Ok(summary) if summary.cursor_moved => continue,
                Ok(_) => {}
                Err(e) => {
                    self.metrics.record_error();
                    warn!(error = %e, "Poll cycle failed");
                }
            }

            tokio::time::sleep(interval).await;
        }

        info!("Event poller stopped");
    }

    /// Runs a single poll cycle.
    ///
    /// # Errors
    ///
    /// Returns the source error if the fetch fails. The cursor is left
    /// untouched in that case.
    pub async fn poll_once(&self) -> Result<PollSummary, SourceError> {
        let query = {
            let cursor = self.cursor.read().await;
            match cursor.token() {
                Some(token) => EventQuery::after(token, self.config.page_size),
                None => EventQuery::first(self.config.start_ledger, self.config.page_size),
            }
        };

        let started = Instant::now();
        let page = self.source.fetch_events(&query).await?;
        self.metrics
            .record_fetch(page.events.len() as u64, started.elapsed());

        let mut summary = PollSummary {
            fetched: page.events.len(),
            ..PollSummary::empty()
        };

        for raw in &page.events {
            match classify(raw) {
                Some(event) => {
                    debug!(
                        kind = %event.kind(),
                        token = event.token_address(),
                        ledger = event.ledger(),
                        "Dispatching event"
                    );
                    self.dispatcher.dispatch(event);
                    self.metrics.record_dispatched();
                    summary.dispatched += 1;
                }
                None => {
                    debug!(topic = ?raw.topic_name(), id = %raw.id, "Dropping unrecognized event");
                    self.metrics.record_dropped();
                    summary.dropped += 1;
                }
            }

            if self
                .cursor
                .write()
                .await
                .advance(&raw.paging_token, raw.ledger)
            {
                summary.cursor_moved = true;
            }
        }

        summary.cursor = self.cursor.read().await.paging_token.clone();

        if summary.fetched > 0 {
            debug!(
                fetched = summary.fetched,
                dispatched = summary.dispatched,
                dropped = summary.dropped,
                cursor = ?summary.cursor,
                "Poll cycle complete"
            );
        }

        Ok(summary)
    }
}
