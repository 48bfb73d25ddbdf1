//! Webhook delivery metrics.
//!
//! Provides atomic counters for monitoring deliveries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Metrics for the delivery engine.
#[derive(Debug)]
pub struct DeliveryMetrics {
    /// Events handed to the engine.
    events_triggered: AtomicU64,

    /// Subscriptions matched across all events.
    subscriptions_matched: AtomicU64,

    /// Deliveries that ended in a 2xx response.
    deliveries_succeeded: AtomicU64,

    /// Deliveries that exhausted their attempts.
    deliveries_failed: AtomicU64,

    /// HTTP attempts made.
    attempts: AtomicU64,

    /// Attempts after the first one of a delivery.
    retries: AtomicU64,

    /// Store operations that failed.
    store_errors: AtomicU64,

    /// Start time for rate calculation.
    start_time: Instant,
}

impl Default for DeliveryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DeliveryMetrics {
    /// Creates a new metrics instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events_triggered: AtomicU64::new(0),
            subscriptions_matched: AtomicU64::new(0),
            deliveries_succeeded: AtomicU64::new(0),
            deliveries_failed: AtomicU64::new(0),
            attempts: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            store_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Records an event and the number of subscriptions it matched.
    pub fn record_trigger(&self, matched: usize) {
        self.events_triggered.fetch_add(1, Ordering::Relaxed);
        self.subscriptions_matched
            .fetch_add(matched as u64, Ordering::Relaxed);
    }

    /// Records one HTTP attempt.
    pub fn record_attempt(&self, attempt: u32) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if attempt > 1 {
            self.retries.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records a successful delivery.
    pub fn record_success(&self) {
        self.deliveries_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed delivery.
    pub fn record_failure(&self) {
        self.deliveries_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed store operation.
    pub fn record_store_error(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of triggered events.
    #[must_use]
    pub fn events_triggered(&self) -> u64 {
        self.events_triggered.load(Ordering::Relaxed)
    }

    /// Returns the number of matched subscriptions.
    #[must_use]
    pub fn subscriptions_matched(&self) -> u64 {
        self.subscriptions_matched.load(Ordering::Relaxed)
    }

    /// Returns the number of successful deliveries.
    #[must_use]
    pub fn deliveries_succeeded(&self) -> u64 {
        self.deliveries_succeeded.load(Ordering::Relaxed)
    }

    /// Returns the number of failed deliveries.
    #[must_use]
    pub fn deliveries_failed(&self) -> u64 {
        self.deliveries_failed.load(Ordering::Relaxed)
    }

    /// Returns the number of HTTP attempts.
    #[must_use]
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Returns the number of retries.
    #[must_use]
    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Returns the number of failed store operations.
    #[must_use]
    pub fn store_errors(&self) -> u64 {
        self.store_errors.load(Ordering::Relaxed)
    }

    /// Returns the uptime.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns the success rate over finished deliveries (0.0 to 1.0).
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        let finished = self.deliveries_succeeded() + self.deliveries_failed();
        if finished > 0 {
            self.deliveries_succeeded() as f64 / finished as f64
        } else {
            0.0
        }
    }

    /// Returns a snapshot of all metrics.
    #[must_use]
    pub fn snapshot(&self) -> DeliveryMetricsSnapshot {
        DeliveryMetricsSnapshot {
            events_triggered: self.events_triggered(),
            subscriptions_matched: self.subscriptions_matched(),
            deliveries_succeeded: self.deliveries_succeeded(),
            deliveries_failed: self.deliveries_failed(),
            attempts: self.attempts(),
            retries: self.retries(),
            store_errors: self.store_errors(),
            uptime: self.uptime(),
            success_rate: self.success_rate(),
        }
    }

    /// Resets all counters.
    pub fn reset(&self) {
        self.events_triggered.store(0, Ordering::Relaxed);
        self.subscriptions_matched.store(0, Ordering::Relaxed);
        self.deliveries_succeeded.store(0, Ordering::Relaxed);
        self.deliveries_failed.store(0, Ordering::Relaxed);
        self.attempts.store(0, Ordering::Relaxed);
        self.retries.store(0, Ordering::Relaxed);
        self.store_errors.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time snapshot of delivery metrics.
#[derive(Debug, Clone)]
pub struct DeliveryMetricsSnapshot {
    /// Events triggered.
    pub events_triggered: u64,
    /// Subscriptions matched.
    pub subscriptions_matched: u64,
    /// Successful deliveries.
    pub deliveries_succeeded: u64,
    /// Failed deliveries.
    pub deliveries_failed: u64,
    /// HTTP attempts.
    pub attempts: u64,
    /// Retries.
    pub retries: u64,
    /// Failed store operations.
    pub store_errors: u64,
    /// Uptime.
    pub uptime: Duration,
    /// Success rate.
    pub success_rate: f64,
}
