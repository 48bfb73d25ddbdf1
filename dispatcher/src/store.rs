//! Subscription storage.
//!
//! The [`SubscriptionStore`] trait is what the delivery engine needs from a
//! persistence layer. [`InMemorySubscriptionStore`] backs the binary and the
//! tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::Utc;
use launchpad_sdk::{
    DeliveryLog, EventKind, NewDeliveryLog, NewSubscription, SdkError, WebhookSubscription,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::matcher;

/// Errors returned by a subscription store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No subscription with the given id.
    #[error("subscription not found: {0}")]
    NotFound(Uuid),

    /// The subscription request was rejected.
    #[error("invalid subscription: {0}")]
    Invalid(#[from] SdkError),

    /// The storage backend failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Persistence used by the delivery engine.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Returns the active subscriptions eligible for the event.
    ///
    /// Implementations must apply [`matcher::is_eligible`].
    async fn find_matching_subscriptions(
        &self,
        event: EventKind,
        token_address: Option<&str>,
    ) -> Result<Vec<WebhookSubscription>, StoreError>;

    /// Stamps the subscription's last successful delivery time.
    async fn update_last_triggered(&self, id: Uuid) -> Result<(), StoreError>;

    /// Records the outcome of one delivery.
    async fn log_delivery(&self, entry: NewDeliveryLog) -> Result<DeliveryLog, StoreError>;
}

/// Default number of delivery logs kept in memory.
pub const DEFAULT_LOG_RETENTION: usize = 10_000;

/// In-memory subscription store.
///
/// Keeps at most `log_retention` delivery logs; the oldest are dropped first.
#[derive(Debug)]
pub struct InMemorySubscriptionStore {
    subscriptions: RwLock<Vec<WebhookSubscription>>,
    logs: RwLock<VecDeque<DeliveryLog>>,
    log_retention: usize,
}

impl Default for InMemorySubscriptionStore {
    fn default() -> Self {
        Self::with_subscriptions(Vec::new())
    }
}

impl InMemorySubscriptionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given subscriptions.
    #[must_use]
    pub fn with_subscriptions(subscriptions: Vec<WebhookSubscription>) -> Self {
        Self {
            subscriptions: RwLock::new(subscriptions),
            logs: RwLock::default(),
            log_retention: DEFAULT_LOG_RETENTION,
        }
    }

    /// Sets how many delivery logs are kept. Zero is treated as one.
    #[must_use]
    pub fn with_log_retention(mut self, entries: usize) -> Self {
        self.log_retention = entries.max(1);
        self
    }

    /// Returns the delivery log retention.
    #[must_use]
    pub const fn log_retention(&self) -> usize {
        self.log_retention
    }

    /// Creates a store from registration requests.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Invalid` on the first invalid request.
    pub fn from_requests(requests: Vec<NewSubscription>) -> Result<Self, StoreError> {
        let subscriptions = requests
            .into_iter()
            .map(WebhookSubscription::from_request)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_subscriptions(subscriptions))
    }

    /// Registers a new active subscription.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Invalid` if the request is invalid.
    pub async fn create(&self, request: NewSubscription) -> Result<WebhookSubscription, StoreError> {
        let subscription = WebhookSubscription::from_request(request)?;
        self.subscriptions.write().await.push(subscription.clone());
        Ok(subscription)
    }

    /// Returns a subscription by id.
    pub async fn get(&self, id: Uuid) -> Option<WebhookSubscription> {
        self.subscriptions
            .read()
            .await
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    /// Returns all subscriptions in registration order.
    pub async fn list(&self) -> Vec<WebhookSubscription> {
        self.subscriptions.read().await.clone()
    }

    /// Activates or deactivates a subscription.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the id is unknown.
    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<(), StoreError> {
        let mut subscriptions = self.subscriptions.write().await;
        let subscription = subscriptions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::NotFound(id))?;
        subscription.active = active;
        Ok(())
    }

    /// Removes a subscription.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the id is unknown.
    pub async fn delete(&self, id: Uuid) -> Result<WebhookSubscription, StoreError> {
        let mut subscriptions = self.subscriptions.write().await;
        let position = subscriptions
            .iter()
            .position(|s| s.id == id)
            .ok_or(StoreError::NotFound(id))?;
        Ok(subscriptions.remove(position))
    }

    /// Returns the retained delivery logs in write order.
    pub async fn delivery_logs(&self) -> Vec<DeliveryLog> {
        self.logs.read().await.iter().cloned().collect()
    }

    /// Returns the delivery logs of one subscription.
    pub async fn logs_for_subscription(&self, id: Uuid) -> Vec<DeliveryLog> {
        self.logs
            .read()
            .await
            .iter()
            .filter(|log| log.subscription_id == id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn find_matching_subscriptions(
        &self,
        event: EventKind,
        token_address: Option<&str>,
    ) -> Result<Vec<WebhookSubscription>, StoreError> {
        let subscriptions = self.subscriptions.read().await;
        Ok(matcher::find_matching(
            subscriptions.iter(),
            event,
            token_address,
        ))
    }

    async fn update_last_triggered(&self, id: Uuid) -> Result<(), StoreError> {
        let mut subscriptions = self.subscriptions.write().await;
        let subscription = subscriptions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::NotFound(id))?;
        subscription.last_triggered = Some(Utc::now());
        Ok(())
    }

    async fn log_delivery(&self, entry: NewDeliveryLog) -> Result<DeliveryLog, StoreError> {
        let log = DeliveryLog::from_new(entry);
        let mut logs = self.logs.write().await;
        while logs.len() >= self.log_retention {
            logs.pop_front();
        }
        logs.push_back(log.clone());
        Ok(log)
    }
}
