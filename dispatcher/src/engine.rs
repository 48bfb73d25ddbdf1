//! Webhook delivery engine.
//!
//! Orchestrates subscription matching, concurrent fan-out, and delivery
//! logging for each event handed over by the poller.
//!
//! Events handed over through [`EventDispatcher`] run as tracked background
//! tasks. At most `max_concurrent` of them deliver at once; the rest wait for
//! a permit. [`DeliveryEngine::drain`] waits for every tracked task, so a
//! shutdown never drops a delivery whose event the cursor already passed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;
use launchpad_indexer::EventDispatcher;
use launchpad_sdk::{DomainEvent, EventKind, NewDeliveryLog, WebhookSubscription};
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::metrics::DeliveryMetrics;
use super::sender::WebhookSender;
use super::store::SubscriptionStore;

/// Default limit on events delivered at the same time.
pub const DEFAULT_MAX_CONCURRENT_DELIVERIES: usize = 64;

/// Outcome of triggering one event.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerReport {
    /// Event kind that was triggered.
    pub event: EventKind,

    /// One delivery log per matched subscription.
    pub deliveries: Vec<NewDeliveryLog>,
}

impl TriggerReport {
    /// Creates a report with no deliveries.
    #[must_use]
    pub fn empty(event: EventKind) -> Self {
        Self {
            event,
            deliveries: Vec::new(),
        }
    }

    /// Returns the number of matched subscriptions.
    #[must_use]
    pub fn matched(&self) -> usize {
        self.deliveries.len()
    }

    /// Returns the number of successful deliveries.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.deliveries.iter().filter(|d| d.success).count()
    }

    /// Returns the number of failed deliveries.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.matched() - self.succeeded()
    }
}

/// The webhook delivery engine.
///
/// Cheap to clone; clones share the store, sender, and metrics.
#[derive(Clone)]
pub struct DeliveryEngine {
    /// Subscription store.
    store: Arc<dyn SubscriptionStore>,

    /// HTTP sender.
    sender: WebhookSender,

    /// Metrics.
    metrics: Arc<DeliveryMetrics>,

    /// Permits for background deliveries.
    limiter: Arc<Semaphore>,

    /// Background deliveries not yet reaped.
    in_flight: Arc<Mutex<JoinSet<()>>>,
}

impl std::fmt::Debug for DeliveryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryEngine")
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}

impl DeliveryEngine {
    /// Creates a new delivery engine.
    #[must_use]
    pub fn new(store: Arc<dyn SubscriptionStore>, sender: WebhookSender) -> Self {
        let metrics = sender.metrics();
        Self {
            store,
            sender,
            metrics,
            limiter: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT_DELIVERIES)),
            in_flight: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    /// Sets how many dispatched events may deliver at the same time.
    ///
    /// A limit of zero is treated as one.
    #[must_use]
    pub fn with_max_concurrent(mut self, limit: usize) -> Self {
        self.limiter = Arc::new(Semaphore::new(limit.max(1)));
        self
    }

    /// Returns the number of background deliveries not yet reaped.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tasks().len()
    }

    /// Waits until every dispatched event has been delivered and logged.
    ///
    /// Events dispatched while draining are waited on too.
    pub async fn drain(&self) {
        let mut drained = 0_usize;
        loop {
            let mut tasks = std::mem::take(&mut *self.tasks());
            if tasks.is_empty() {
                break;
            }
            while let Some(result) = tasks.join_next().await {
                drained += 1;
                if let Err(e) = result {
                    error!(error = %e, "Delivery task failed");
                }
            }
        }

        if drained > 0 {
            debug!(count = drained, "Drained background deliveries");
        }
    }

    fn tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the metrics.
    #[must_use]
    pub fn metrics(&self) -> Arc<DeliveryMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Returns the sender.
    #[must_use]
    pub const fn sender(&self) -> &WebhookSender {
        &self.sender
    }

    /// Delivers an event to every matching subscription.
    ///
    /// Deliveries run concurrently and all of them settle before this
    /// returns; one failing subscriber never affects another. A store
    /// failure while matching is logged and yields an empty report.
    pub async fn trigger_event(
        &self,
        event: EventKind,
        data: Value,
        token_address: Option<&str>,
    ) -> TriggerReport {
        let subscriptions = match self
            .store
            .find_matching_subscriptions(event, token_address)
            .await
        {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                error!(event = %event, error = %e, "Failed to load matching subscriptions");
                self.metrics.record_store_error();
                return TriggerReport::empty(event);
            }
        };

        self.metrics.record_trigger(subscriptions.len());

        if subscriptions.is_empty() {
            debug!(event = %event, token = ?token_address, "No subscriptions matched");
            return TriggerReport::empty(event);
        }

        info!(
            event = %event,
            token = ?token_address,
            subscriptions = subscriptions.len(),
            "Triggering webhooks"
        );

        let deliveries = join_all(
            subscriptions
                .iter()
                .map(|subscription| self.deliver_webhook(subscription, event, &data)),
        )
        .await;

        let report = TriggerReport { event, deliveries };
        info!(
            event = %event,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Webhook fan-out complete"
        );
        report
    }

    /// Delivers an event to one subscription and records the outcome.
    ///
    /// Exactly one delivery log is written per call. On success the
    /// subscription's last-triggered time is updated. Store failures are
    /// logged and never propagated.
    pub async fn deliver_webhook(
        &self,
        subscription: &WebhookSubscription,
        event: EventKind,
        data: &Value,
    ) -> NewDeliveryLog {
        let outcome = self.sender.deliver(subscription, event, data).await;

        if outcome.success {
            if let Err(e) = self.store.update_last_triggered(subscription.id).await {
                warn!(
                    subscription_id = %subscription.id,
                    error = %e,
                    "Failed to update last triggered time"
                );
                self.metrics.record_store_error();
            }
        } else {
            warn!(
                subscription_id = %subscription.id,
                event = %event,
                attempts = outcome.attempts,
                error = ?outcome.error_message,
                "Webhook delivery failed"
            );
        }

        if let Err(e) = self.store.log_delivery(outcome.clone()).await {
            error!(
                subscription_id = %subscription.id,
                error = %e,
                "Failed to write delivery log"
            );
            self.metrics.record_store_error();
        }

        outcome
    }

    /// Triggers a classified domain event.
    pub async fn trigger_domain_event(&self, event: &DomainEvent) -> TriggerReport {
        let kind = event.kind();
        match event.data() {
            Ok(data) => {
                self.trigger_event(kind, data, Some(event.token_address()))
                    .await
            }
            Err(e) => {
                error!(event = %kind, tx_hash = %event.tx_hash(), error = %e, "Failed to encode event data");
                TriggerReport::empty(kind)
            }
        }
    }
}

impl EventDispatcher for DeliveryEngine {
    /// Starts delivery in a tracked background task and returns immediately.
    fn dispatch(&self, event: DomainEvent) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            error!(event = %event.kind(), "No tokio runtime, dropping event");
            return;
        };

        let engine = self.clone();
        let limiter = Arc::clone(&self.limiter);

        let mut tasks = self.tasks();
        while let Some(result) = tasks.try_join_next() {
            if let Err(e) = result {
                error!(error = %e, "Delivery task failed");
            }
        }

        tasks.spawn_on(
            async move {
                let Ok(_permit) = limiter.acquire_owned().await else {
                    error!(event = %event.kind(), "Delivery limiter closed, dropping event");
                    return;
                };
                engine.trigger_domain_event(&event).await;
            },
            &handle,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use launchpad_sdk::{Amount, BurnEvent, DeliveryLog, NewSubscription, TokenCreatedEvent};
    use serde_json::json;
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::sender::DeliveryConfig;
    use crate::sleeper::{RecordingSleeper, Sleeper};
    use crate::store::{InMemorySubscriptionStore, StoreError};

    fn engine_with(
        store: Arc<dyn SubscriptionStore>,
        config: DeliveryConfig,
    ) -> (DeliveryEngine, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::new());
        let sender = WebhookSender::new(config)
            .expect("sender")
            .with_sleeper(Arc::clone(&sleeper) as Arc<dyn Sleeper>);
        (DeliveryEngine::new(store, sender), sleeper)
    }

    async fn subscribe(
        store: &InMemorySubscriptionStore,
        url: String,
        events: Vec<EventKind>,
        token: Option<&str>,
    ) -> WebhookSubscription {
        let mut request = NewSubscription::new(url, events, "s3cr3t", "GOWNER");
        if let Some(token) = token {
            request = request.with_token(token);
        }
        store.create(request).await.expect("create")
    }

    async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(response)
            .mount(server)
            .await;
    }

    fn delivery_for(report: &TriggerReport, id: Uuid) -> &NewDeliveryLog {
        report
            .deliveries
            .iter()
            .find(|d| d.subscription_id == id)
            .expect("delivery")
    }

    /// Store whose every operation fails.
    struct BrokenStore;

    #[async_trait]
    impl SubscriptionStore for BrokenStore {
        async fn find_matching_subscriptions(
            &self,
            _event: EventKind,
            _token_address: Option<&str>,
        ) -> Result<Vec<WebhookSubscription>, StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }

        async fn update_last_triggered(&self, _id: Uuid) -> Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }

        async fn log_delivery(&self, _entry: NewDeliveryLog) -> Result<DeliveryLog, StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
    }

    #[test]
    fn test_trigger_report_counts() {
        let report = TriggerReport::empty(EventKind::BurnSelf);
        assert_eq!(report.matched(), 0);
        assert_eq!(report.succeeded(), 0);
        assert_eq!(report.failed(), 0);
    }

    #[tokio::test]
    async fn test_trigger_without_matches_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = Arc::new(InMemorySubscriptionStore::new());
        let inactive = subscribe(
            &store,
            server.uri(),
            vec![EventKind::BurnSelf],
            None,
        )
        .await;
        store.set_active(inactive.id, false).await.expect("deactivate");
        subscribe(
            &store,
            server.uri(),
            vec![EventKind::BurnSelf],
            Some("CTOKEN2"),
        )
        .await;

        let (engine, _) = engine_with(Arc::<InMemorySubscriptionStore>::clone(&store), DeliveryConfig::default());
        let report = engine
            .trigger_event(EventKind::BurnSelf, json!({}), Some("CTOKEN1"))
            .await;

        assert_eq!(report.matched(), 0);
        assert!(store.delivery_logs().await.is_empty());
        assert_eq!(engine.metrics().events_triggered(), 1);
    }

    #[tokio::test]
    async fn test_fan_out_isolates_failing_subscriber() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/slow",
            ResponseTemplate::new(200).set_delay(Duration::from_millis(500)),
        )
        .await;
        mount(&server, "/ok", ResponseTemplate::new(200)).await;

        let store = Arc::new(InMemorySubscriptionStore::new());
        let slow = subscribe(
            &store,
            format!("{}/slow", server.uri()),
            vec![EventKind::TokenCreated],
            None,
        )
        .await;
        let ok = subscribe(
            &store,
            format!("{}/ok", server.uri()),
            vec![EventKind::TokenCreated],
            None,
        )
        .await;

        let (engine, sleeper) = engine_with(
            Arc::<InMemorySubscriptionStore>::clone(&store),
            DeliveryConfig {
                timeout: Duration::from_millis(50),
                ..Default::default()
            },
        );
        let report = engine
            .trigger_event(EventKind::TokenCreated, json!({"symbol": "LPD"}), None)
            .await;

        assert_eq!(report.matched(), 2);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);

        let slow_delivery = delivery_for(&report, slow.id);
        assert!(!slow_delivery.success);
        assert_eq!(slow_delivery.attempts, 3);
        assert!(slow_delivery.status_code.is_none());

        let ok_delivery = delivery_for(&report, ok.id);
        assert!(ok_delivery.success);
        assert_eq!(ok_delivery.attempts, 1);
        assert_eq!(ok_delivery.status_code, Some(200));

        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );

        assert_eq!(store.delivery_logs().await.len(), 2);
        assert_eq!(store.logs_for_subscription(slow.id).await.len(), 1);
        assert!(store
            .get(ok.id)
            .await
            .expect("ok")
            .last_triggered
            .is_some());
        assert!(store
            .get(slow.id)
            .await
            .expect("slow")
            .last_triggered
            .is_none());
    }

    #[tokio::test]
    async fn test_delivered_signature_verifies() {
        let server = MockServer::start().await;
        mount(&server, "/hook", ResponseTemplate::new(200)).await;

        let store = Arc::new(InMemorySubscriptionStore::new());
        subscribe(
            &store,
            format!("{}/hook", server.uri()),
            vec![EventKind::TokenCreated],
            None,
        )
        .await;

        let (engine, _) = engine_with(store, DeliveryConfig::default());
        let data = json!({"tokenAddress": "CTOKEN", "name": "Launch", "decimals": 7});
        engine
            .trigger_event(EventKind::TokenCreated, data.clone(), Some("CTOKEN"))
            .await;

        let requests = server.received_requests().await.expect("requests");
        assert_eq!(requests.len(), 1);

        let header = requests[0]
            .headers
            .get("X-Webhook-Signature")
            .and_then(|v| v.to_str().ok())
            .expect("signature")
            .to_string();
        let body: launchpad_sdk::WebhookPayload =
            serde_json::from_slice(&requests[0].body).expect("payload");

        assert_eq!(body.event, EventKind::TokenCreated);
        assert_eq!(body.data, data);
        assert_eq!(body.signature, header);
        assert!(body.verify("s3cr3t"));
        assert!(!body.verify("wrong"));
    }

    #[tokio::test]
    async fn test_store_failures_are_not_propagated() {
        let server = MockServer::start().await;
        mount(&server, "/hook", ResponseTemplate::new(200)).await;

        let (engine, _) = engine_with(Arc::new(BrokenStore), DeliveryConfig::default());

        let report = engine
            .trigger_event(EventKind::BurnSelf, json!({}), Some("CTOKEN"))
            .await;
        assert_eq!(report.matched(), 0);

        let subscription = WebhookSubscription::from_request(NewSubscription::new(
            format!("{}/hook", server.uri()),
            vec![EventKind::BurnSelf],
            "s3cr3t",
            "GOWNER",
        ))
        .expect("subscription");
        let outcome = engine
            .deliver_webhook(&subscription, EventKind::BurnSelf, &json!({}))
            .await;

        assert!(outcome.success);
        assert_eq!(engine.metrics().store_errors(), 3);
    }

    #[tokio::test]
    async fn test_trigger_domain_event_uses_token_scope() {
        let server = MockServer::start().await;
        mount(&server, "/hook", ResponseTemplate::new(200)).await;

        let store = Arc::new(InMemorySubscriptionStore::new());
        let scoped = subscribe(
            &store,
            format!("{}/hook", server.uri()),
            vec![EventKind::BurnSelf],
            Some("CTOKEN1"),
        )
        .await;

        let (engine, _) = engine_with(Arc::<InMemorySubscriptionStore>::clone(&store), DeliveryConfig::default());
        let event = DomainEvent::BurnSelf(BurnEvent {
            token_address: "CTOKEN1".to_string(),
            tx_hash: "tx-1".to_string(),
            ledger: 10,
            from: "GHOLDER".to_string(),
            amount: Amount::new(5),
            burner: "GHOLDER".to_string(),
            token_index: None,
        });

        let report = engine.trigger_domain_event(&event).await;

        assert_eq!(report.matched(), 1);
        let logs = store.logs_for_subscription(scoped.id).await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].payload.data["amount"], json!("5"));
    }

    fn created_event(tx_hash: &str) -> DomainEvent {
        DomainEvent::TokenCreated(TokenCreatedEvent {
            token_address: "CTOKEN".to_string(),
            tx_hash: tx_hash.to_string(),
            ledger: 99,
            creator: "GCREATOR".to_string(),
            name: "Launch".to_string(),
            symbol: "LPD".to_string(),
            decimals: 7,
            initial_supply: Amount::new(1_000_000),
        })
    }

    #[tokio::test]
    async fn test_drain_waits_for_slow_delivery() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/slow",
            ResponseTemplate::new(200).set_delay(Duration::from_millis(300)),
        )
        .await;

        let store = Arc::new(InMemorySubscriptionStore::new());
        let sub = subscribe(
            &store,
            format!("{}/slow", server.uri()),
            vec![EventKind::TokenCreated],
            None,
        )
        .await;

        let (engine, _) = engine_with(Arc::<InMemorySubscriptionStore>::clone(&store), DeliveryConfig::default());
        engine.dispatch(created_event("tx-slow"));
        assert_eq!(engine.in_flight(), 1);
        assert!(store.delivery_logs().await.is_empty());

        engine.drain().await;

        let logs = store.logs_for_subscription(sub.id).await;
        assert_eq!(logs.len(), 1);
        assert!(logs[0].success);
        assert_eq!(engine.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_drain_without_dispatches_returns() {
        let (engine, _) = engine_with(
            Arc::new(InMemorySubscriptionStore::new()),
            DeliveryConfig::default(),
        );
        engine.drain().await;
        assert_eq!(engine.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_respects_concurrency_limit() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/hook",
            ResponseTemplate::new(200).set_delay(Duration::from_millis(500)),
        )
        .await;

        let store = Arc::new(InMemorySubscriptionStore::new());
        subscribe(
            &store,
            format!("{}/hook", server.uri()),
            vec![EventKind::TokenCreated],
            None,
        )
        .await;

        let (engine, _) = engine_with(Arc::<InMemorySubscriptionStore>::clone(&store), DeliveryConfig::default());
        let engine = engine.with_max_concurrent(1);
        engine.dispatch(created_event("tx-1"));
        engine.dispatch(created_event("tx-2"));

        tokio::time::sleep(Duration::from_millis(200)).await;
        let received = server.received_requests().await.expect("requests");
        assert_eq!(received.len(), 1);

        engine.drain().await;
        assert_eq!(store.delivery_logs().await.len(), 2);
        assert_eq!(engine.metrics().deliveries_succeeded(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_delivers_in_background() {
        let server = MockServer::start().await;
        mount(&server, "/hook", ResponseTemplate::new(200)).await;

        let store = Arc::new(InMemorySubscriptionStore::new());
        let sub = subscribe(
            &store,
            format!("{}/hook", server.uri()),
            vec![EventKind::TokenCreated],
            None,
        )
        .await;

        let (engine, _) = engine_with(Arc::<InMemorySubscriptionStore>::clone(&store), DeliveryConfig::default());
        engine.dispatch(created_event("tx-9"));

        let mut logs = Vec::new();
        for _ in 0..100 {
            logs = store.logs_for_subscription(sub.id).await;
            if !logs.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(logs.len(), 1);
        assert!(logs[0].success);
    }
}
