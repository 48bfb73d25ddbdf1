//! Metrics tracking for the event poller.
//!
//! Provides atomic counters for monitoring polling.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Metrics for the event poller.
#[derive(Debug)]
pub struct PollerMetrics {
    /// Number of fetches issued.
    polls: AtomicU64,

    /// Number of fetches that returned no events.
    empty_polls: AtomicU64,

    /// Number of raw events fetched.
    events_fetched: AtomicU64,

    /// Number of events classified and dispatched.
    events_dispatched: AtomicU64,

    /// Number of events with an unrecognized topic.
    events_dropped: AtomicU64,

    /// Number of failed poll cycles.
    errors: AtomicU64,

    /// Total fetch time in nanoseconds.
    total_fetch_time_ns: AtomicU64,

    /// Start time for rate calculation.
    start_time: Instant,
}

impl Default for PollerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PollerMetrics {
    /// Creates a new metrics instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            polls: AtomicU64::new(0),
            empty_polls: AtomicU64::new(0),
            events_fetched: AtomicU64::new(0),
            events_dispatched: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            total_fetch_time_ns: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Records a completed fetch.
    pub fn record_fetch(&self, events: u64, duration: Duration) {
        self.polls.fetch_add(1, Ordering::Relaxed);
        if events == 0 {
            self.empty_polls.fetch_add(1, Ordering::Relaxed);
        }
        self.events_fetched.fetch_add(events, Ordering::Relaxed);
        self.total_fetch_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Records a dispatched event.
    pub fn record_dispatched(&self) {
        self.events_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an unrecognized event.
    pub fn record_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed poll cycle.
    pub fn record_error(&self) {
        self.polls.fetch_add(1, Ordering::Relaxed);
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of fetches issued.
    #[must_use]
    pub fn polls(&self) -> u64 {
        self.polls.load(Ordering::Relaxed)
    }

    /// Returns the number of empty fetches.
    #[must_use]
    pub fn empty_polls(&self) -> u64 {
        self.empty_polls.load(Ordering::Relaxed)
    }

    /// Returns the number of raw events fetched.
    #[must_use]
    pub fn events_fetched(&self) -> u64 {
        self.events_fetched.load(Ordering::Relaxed)
    }

    /// Returns the number of dispatched events.
    #[must_use]
    pub fn events_dispatched(&self) -> u64 {
        self.events_dispatched.load(Ordering::Relaxed)
    }

    /// Returns the number of dropped events.
    #[must_use]
    pub fn events_dropped(&self) -> u64 {
        self.events_dropped.load(Ordering::Relaxed)
    }

    /// Returns the number of failed poll cycles.
    #[must_use]
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Returns the average fetch time.
    #[must_use]
    pub fn average_fetch_time(&self) -> Duration {
        let successful = self.polls().saturating_sub(self.errors());
        if successful == 0 {
            return Duration::ZERO;
        }
        let total_ns = self.total_fetch_time_ns.load(Ordering::Relaxed);
        Duration::from_nanos(total_ns / successful)
    }

    /// Returns the events per second since start.
    #[must_use]
    pub fn events_per_second(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.events_fetched() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Returns the error rate over all poll cycles (0.0 to 1.0).
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        let polls = self.polls();
        if polls == 0 {
            return 0.0;
        }
        self.errors() as f64 / polls as f64
    }

    /// Returns a snapshot of all metrics.
    #[must_use]
    pub fn snapshot(&self) -> PollerMetricsSnapshot {
        PollerMetricsSnapshot {
            polls: self.polls(),
            empty_polls: self.empty_polls(),
            events_fetched: self.events_fetched(),
            events_dispatched: self.events_dispatched(),
            events_dropped: self.events_dropped(),
            errors: self.errors(),
            average_fetch_time: self.average_fetch_time(),
            events_per_second: self.events_per_second(),
            error_rate: self.error_rate(),
        }
    }

    /// Resets all counters.
    pub fn reset(&self) {
        self.polls.store(0, Ordering::Relaxed);
        self.empty_polls.store(0, Ordering::Relaxed);
        self.events_fetched.store(0, Ordering::Relaxed);
        self.events_dispatched.store(0, Ordering::Relaxed);
        self.events_dropped.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        self.total_fetch_time_ns.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time snapshot of poller metrics.
#[derive(Debug, Clone)]
pub struct PollerMetricsSnapshot {
    /// Fetches issued.
    pub polls: u64,
    /// Empty fetches.
    pub empty_polls: u64,
    /// Raw events fetched.
    pub events_fetched: u64,
    /// Events dispatched.
    pub events_dispatched: u64,
    /// Events dropped.
    pub events_dropped: u64,
    /// Failed poll cycles.
    pub errors: u64,
    /// Average fetch time.
    pub average_fetch_time: Duration,
    /// Events per second.
    pub events_per_second: f64,
    /// Error rate.
    pub error_rate: f64,
}
