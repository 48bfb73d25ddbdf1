//! Dispatcher service configuration.
//!
//! Provides configuration options for the webhook dispatcher and the event
//! poller it drives. Values are read from the environment by
//! [`DispatcherConfig::from_env`].

use std::env;
use std::time::Duration;

use launchpad_indexer::{PollerConfig, SourceConfig};
use serde::{Deserialize, Serialize};

use crate::engine::DEFAULT_MAX_CONCURRENT_DELIVERIES;
use crate::sender::DeliveryConfig;
use crate::store::DEFAULT_LOG_RETENTION;

/// Default event API base URL.
pub const DEFAULT_EVENTS_API_URL: &str = "http://localhost:8000";

/// Largest page the event API accepts.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Configuration for the dispatcher service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Event API base URL.
    pub events_api_url: String,

    /// Factory contract whose events are polled.
    pub contract_id: String,

    /// Poll interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Maximum events requested per poll.
    pub page_size: u32,

    /// Ledger to start from when no cursor is held.
    pub start_ledger: Option<u64>,

    /// Per-attempt webhook timeout in milliseconds.
    pub webhook_timeout_ms: u64,

    /// Maximum delivery attempts per subscription.
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub retry_base_delay_ms: u64,

    /// Optional JSON file of subscriptions to load at startup.
    pub subscriptions_file: Option<String>,

    /// Maximum events delivered at the same time.
    pub max_concurrent_deliveries: usize,

    /// Delivery logs kept by the in-memory store.
    pub log_retention: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            events_api_url: DEFAULT_EVENTS_API_URL.to_string(),
            contract_id: String::new(),
            poll_interval_ms: 5000,
            page_size: 100,
            start_ledger: None,
            webhook_timeout_ms: 5000,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            subscriptions_file: None,
            max_concurrent_deliveries: DEFAULT_MAX_CONCURRENT_DELIVERIES,
            log_retention: DEFAULT_LOG_RETENTION,
        }
    }
}

impl DispatcherConfig {
    /// Creates a new configuration for the given factory contract.
    #[must_use]
    pub fn new(contract_id: impl Into<String>) -> Self {
        Self {
            contract_id: contract_id.into(),
            ..Default::default()
        }
    }

    /// Sets the event API base URL.
    #[must_use]
    pub fn with_events_api_url(mut self, url: impl Into<String>) -> Self {
        self.events_api_url = url.into();
        self
    }

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

    /// Sets the starting ledger.
    #[must_use]
    pub fn with_start_ledger(mut self, ledger: u64) -> Self {
        self.start_ledger = Some(ledger);
        self
    }

    /// Sets the per-attempt webhook timeout.
    #[must_use]
    pub fn with_webhook_timeout(mut self, ms: u64) -> Self {
        self.webhook_timeout_ms = ms;
        self
    }

    /// Sets the maximum delivery attempts.
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the backoff base delay.
    #[must_use]
    pub fn with_retry_base_delay(mut self, ms: u64) -> Self {
        self.retry_base_delay_ms = ms;
        self
    }

    /// Sets the subscriptions file.
    #[must_use]
    pub fn with_subscriptions_file(mut self, path: impl Into<String>) -> Self {
        self.subscriptions_file = Some(path.into());
        self
    }

    /// Sets the delivery concurrency limit.
    #[must_use]
    pub fn with_max_concurrent_deliveries(mut self, limit: usize) -> Self {
        self.max_concurrent_deliveries = limit;
        self
    }

    /// Sets how many delivery logs the in-memory store keeps.
    #[must_use]
    pub fn with_log_retention(mut self, entries: usize) -> Self {
        self.log_retention = entries;
        self
    }

    /// Loads the configuration from environment variables.
    ///
    /// Unset variables fall back to their defaults, except
    /// `FACTORY_CONTRACT_ID` which is required.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a value does not
    /// parse, or the resulting configuration is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`DispatcherConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let contract_id =
            get("FACTORY_CONTRACT_ID").ok_or(ConfigError::MissingVar("FACTORY_CONTRACT_ID"))?;

        let config = Self {
            events_api_url: get("EVENTS_API_URL").unwrap_or(defaults.events_api_url),
            contract_id,
            poll_interval_ms: parse_var(&get, "POLL_INTERVAL_MS")?
                .unwrap_or(defaults.poll_interval_ms),
            page_size: parse_var(&get, "POLL_PAGE_SIZE")?.unwrap_or(defaults.page_size),
            start_ledger: parse_var(&get, "START_LEDGER")?,
            webhook_timeout_ms: parse_var(&get, "WEBHOOK_TIMEOUT_MS")?
                .unwrap_or(defaults.webhook_timeout_ms),
            max_retries: parse_var(&get, "WEBHOOK_MAX_RETRIES")?.unwrap_or(defaults.max_retries),
            retry_base_delay_ms: parse_var(&get, "WEBHOOK_RETRY_BASE_DELAY_MS")?
                .unwrap_or(defaults.retry_base_delay_ms),
            subscriptions_file: get("WEBHOOK_SUBSCRIPTIONS_FILE"),
            max_concurrent_deliveries: parse_var(&get, "WEBHOOK_MAX_CONCURRENT")?
                .unwrap_or(defaults.max_concurrent_deliveries),
            log_retention: parse_var(&get, "WEBHOOK_LOG_RETENTION")?
                .unwrap_or(defaults.log_retention),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.contract_id.trim().is_empty() {
            return Err(ConfigError::MissingVar("FACTORY_CONTRACT_ID"));
        }

        if !self.events_api_url.starts_with("http://")
            && !self.events_api_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidEventsUrl(self.events_api_url.clone()));
        }

        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidPageSize(self.page_size));
        }

        if self.webhook_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        if self.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries);
        }

        if self.max_concurrent_deliveries == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }

        if self.log_retention == 0 {
            return Err(ConfigError::InvalidLogRetention);
        }

        Ok(())
    }

    /// Returns the poller configuration.
    #[must_use]
    pub fn poller_config(&self) -> PollerConfig {
        let config = PollerConfig::default()
            .with_poll_interval(self.poll_interval_ms)
            .with_page_size(self.page_size);

        match self.start_ledger {
            Some(ledger) => config.with_start_ledger(ledger),
            None => config,
        }
    }

    /// Returns the event source configuration.
    #[must_use]
    pub fn source_config(&self) -> SourceConfig {
        SourceConfig::new(self.events_api_url.clone(), self.contract_id.clone())
    }

    /// Returns the webhook delivery configuration.
    #[must_use]
    pub fn delivery_config(&self) -> DeliveryConfig {
        DeliveryConfig {
            max_retries: self.max_retries,
            base_delay_ms: self.retry_base_delay_ms,
            timeout: Duration::from_millis(self.webhook_timeout_ms),
            ..DeliveryConfig::default()
        }
    }
}

fn parse_var<T, G>(get: &G, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar { key, value: raw }),
        None => Ok(None),
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is missing.
    #[error("{0} must be set")]
    MissingVar(&'static str),

    /// A variable could not be parsed.
    #[error("{key} has an invalid value: {value}")]
    InvalidVar {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
    },

    /// Event API URL is not http(s).
    #[error("events api url must start with http:// or https://: {0}")]
    InvalidEventsUrl(String),

    /// Invalid poll interval.
    #[error("poll_interval_ms must be > 0")]
    InvalidPollInterval,

    /// Invalid page size.
    #[error("page_size must be between 1 and 1000, got {0}")]
    InvalidPageSize(u32),

    /// Invalid webhook timeout.
    #[error("webhook_timeout_ms must be > 0")]
    InvalidTimeout,

    /// Invalid retry count.
    #[error("max_retries must be >= 1")]
    InvalidMaxRetries,

    /// Invalid delivery concurrency.
    #[error("max_concurrent_deliveries must be >= 1")]
    InvalidConcurrency,

    /// Invalid log retention.
    #[error("log_retention must be >= 1")]
    InvalidLogRetention,
}
