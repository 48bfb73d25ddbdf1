//! Event API client configuration.

use std::time::Duration;

use super::error::SourceError;

/// Default event API base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Event API client configuration.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Base URL for the event API.
    pub base_url: String,

    /// Token-factory contract whose events are polled.
    pub contract_id: String,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            contract_id: String::new(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            user_agent: format!("launchpad-indexer/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl SourceConfig {
    /// Creates a new configuration for the given API and contract.
    #[must_use]
    pub fn new(base_url: impl Into<String>, contract_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            contract_id: contract_id.into(),
            ..Default::default()
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), SourceError> {
        if self.base_url.is_empty() {
            return Err(SourceError::InvalidConfig(
                "base_url cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(SourceError::InvalidConfig(
                "base_url must start with http:// or https://".to_string(),
            ));
        }

        if self.contract_id.trim().is_empty() {
            return Err(SourceError::InvalidConfig(
                "contract_id cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
