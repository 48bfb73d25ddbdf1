//! Webhook delivery for the dispatcher.
//!
//! Handles POSTing a signed payload to one subscriber with bounded retries
//! and exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use launchpad_sdk::signing::{EVENT_HEADER, SIGNATURE_HEADER};
use launchpad_sdk::{EventKind, NewDeliveryLog, WebhookPayload, WebhookSubscription};
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, warn};

use super::metrics::DeliveryMetrics;
use super::sleeper::{Sleeper, TokioSleeper};

/// User agent sent with every delivery.
pub const USER_AGENT: &str = concat!("launchpad-webhooks/", env!("CARGO_PKG_VERSION"));

/// Configuration for the webhook sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryConfig {
    /// Maximum attempts per delivery.
    pub max_retries: u32,

    /// Backoff base delay in milliseconds.
    pub base_delay_ms: u64,

    /// Per-attempt request timeout.
    pub timeout: Duration,

    /// User agent header value.
    pub user_agent: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            timeout: Duration::from_millis(5000),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl DeliveryConfig {
    /// Returns the delay before the attempt following `attempt`.
    ///
    /// Doubles from the base delay: `base * 2^(attempt - 1)`.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let delay = self.base_delay_ms.saturating_mul(1_u64 << exponent);
        Duration::from_millis(delay)
    }
}

/// Errors creating a sender.
#[derive(Debug, thiserror::Error)]
pub enum SenderError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Result of a single HTTP attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AttemptOutcome {
    /// Subscriber answered with a 2xx status.
    Success { status_code: u16 },

    /// Non-2xx status or transport failure.
    Failure {
        status_code: Option<u16>,
        error: String,
    },
}

/// Delivers payloads to a single subscriber endpoint.
#[derive(Clone)]
pub struct WebhookSender {
    config: DeliveryConfig,
    http: reqwest::Client,
    sleeper: Arc<dyn Sleeper>,
    metrics: Arc<DeliveryMetrics>,
}

impl std::fmt::Debug for WebhookSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSender")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WebhookSender {
    /// Creates a new sender.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: DeliveryConfig) -> Result<Self, SenderError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            config,
            http,
            sleeper: Arc::new(TokioSleeper),
            metrics: Arc::new(DeliveryMetrics::new()),
        })
    }

    /// Replaces the backoff sleeper.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Replaces the metrics sink.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<DeliveryMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// Returns the metrics.
    #[must_use]
    pub fn metrics(&self) -> Arc<DeliveryMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Signs the event data and delivers it to the subscription.
    ///
    /// The payload is built once and resent unchanged on every attempt. The
    /// returned entry is the delivery log for this subscription; it is never
    /// an error, failures are described inside it.
    pub async fn deliver(
        &self,
        subscription: &WebhookSubscription,
        event: EventKind,
        data: &Value,
    ) -> NewDeliveryLog {
        let payload = match WebhookPayload::new(event, data.clone(), &subscription.secret) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(subscription_id = %subscription.id, error = %e, "Failed to sign payload");
                let unsigned = WebhookPayload::unsigned(event, Utc::now(), data.clone());
                return self.failed_without_send(subscription, event, unsigned, e.to_string());
            }
        };

        let url = match parse_endpoint(&subscription.url) {
            Ok(url) => url,
            Err(error) => {
                warn!(
                    subscription_id = %subscription.id,
                    url = %subscription.url,
                    error = %error,
                    "Invalid webhook URL"
                );
                return self.failed_without_send(subscription, event, payload, error);
            }
        };

        let max_attempts = self.config.max_retries.max(1);
        let mut attempts = 0;
        let mut status_code = None;
        let mut error_message = None;
        let mut success = false;
        let mut last_attempt_at = Utc::now();

        while attempts < max_attempts {
            attempts += 1;
            self.metrics.record_attempt(attempts);

            let outcome = self.try_send(&url, &payload).await;
            last_attempt_at = Utc::now();

            match outcome {
                AttemptOutcome::Success { status_code: code } => {
                    debug!(
                        subscription_id = %subscription.id,
                        attempt = attempts,
                        status = code,
                        "Webhook delivered"
                    );
                    status_code = Some(code);
                    error_message = None;
                    success = true;
                    break;
                }
                AttemptOutcome::Failure {
                    status_code: code,
                    error,
                } => {
                    warn!(
                        subscription_id = %subscription.id,
                        attempt = attempts,
                        max_attempts,
                        status = ?code,
                        error = %error,
                        "Webhook attempt failed"
                    );
                    if code.is_some() {
                        status_code = code;
                    }
                    error_message = Some(error);

                    if attempts < max_attempts {
                        self.sleeper
                            .sleep(self.config.backoff_delay(attempts))
                            .await;
                    }
                }
            }
        }

        if success {
            self.metrics.record_success();
        } else {
            self.metrics.record_failure();
        }

        NewDeliveryLog {
            subscription_id: subscription.id,
            event,
            payload,
            status_code,
            success,
            attempts,
            last_attempt_at,
            error_message,
        }
    }

    /// Attempts one POST.
    async fn try_send(&self, url: &Url, payload: &WebhookPayload) -> AttemptOutcome {
        let request = self
            .http
            .post(url.clone())
            .header(SIGNATURE_HEADER, payload.signature.as_str())
            .header(EVENT_HEADER, payload.event.as_str())
            .json(payload);

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    AttemptOutcome::Success {
                        status_code: status.as_u16(),
                    }
                } else {
                    AttemptOutcome::Failure {
                        status_code: Some(status.as_u16()),
                        error: format!("HTTP {}", status.as_u16()),
                    }
                }
            }
            Err(e) if e.is_timeout() => AttemptOutcome::Failure {
                status_code: None,
                error: format!(
                    "request timed out after {} ms",
                    self.config.timeout.as_millis()
                ),
            },
            Err(e) => AttemptOutcome::Failure {
                status_code: None,
                error: e.to_string(),
            },
        }
    }

    /// Builds a one-attempt failure for a delivery that could not be sent.
    fn failed_without_send(
        &self,
        subscription: &WebhookSubscription,
        event: EventKind,
        payload: WebhookPayload,
        error: String,
    ) -> NewDeliveryLog {
        self.metrics.record_attempt(1);
        self.metrics.record_failure();

        NewDeliveryLog {
            subscription_id: subscription.id,
            event,
            payload,
            status_code: None,
            success: false,
            attempts: 1,
            last_attempt_at: Utc::now(),
            error_message: Some(error),
        }
    }
}

/// Parses a subscriber URL, accepting only http and https.
fn parse_endpoint(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("invalid webhook url: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported webhook url scheme: {other}")),
    }
}
