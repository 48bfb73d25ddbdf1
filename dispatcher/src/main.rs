//! Launchpad Dispatcher binary.
//!
//! Entry point for the service that polls factory events and delivers them
//! to webhook subscribers.

use std::sync::Arc;

use anyhow::Context;
use launchpad_dispatcher::{
    DeliveryEngine, DispatcherConfig, InMemorySubscriptionStore, WebhookSender,
};
use launchpad_indexer::{EventPoller, HttpEventSource};
use launchpad_sdk::NewSubscription;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,launchpad_dispatcher=debug,launchpad_indexer=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = DispatcherConfig::from_env().context("invalid configuration")?;

    tracing::info!("Starting Launchpad Dispatcher");
    tracing::info!("Events API: {}", config.events_api_url);
    tracing::info!("Factory contract: {}", config.contract_id);
    tracing::info!(
        "Poll interval: {} ms, page size: {}",
        config.poll_interval_ms,
        config.page_size
    );
    tracing::info!(
        "Webhook timeout: {} ms, max attempts: {}, base delay: {} ms",
        config.webhook_timeout_ms,
        config.max_retries,
        config.retry_base_delay_ms
    );
    tracing::info!(
        "Max concurrent deliveries: {}, delivery logs kept: {}",
        config.max_concurrent_deliveries,
        config.log_retention
    );

    let store = match &config.subscriptions_file {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read subscriptions file {path}"))?;
            let requests: Vec<NewSubscription> = serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse subscriptions file {path}"))?;
            let store = InMemorySubscriptionStore::from_requests(requests)?
                .with_log_retention(config.log_retention);
            tracing::info!("Loaded {} subscriptions from {}", store.list().await.len(), path);
            store
        }
        None => {
            tracing::warn!("No WEBHOOK_SUBSCRIPTIONS_FILE set, starting with no subscriptions");
            InMemorySubscriptionStore::new().with_log_retention(config.log_retention)
        }
    };

    let sender = WebhookSender::new(config.delivery_config())?;
    let engine = DeliveryEngine::new(Arc::new(store), sender)
        .with_max_concurrent(config.max_concurrent_deliveries);
    let source = HttpEventSource::new(config.source_config())?;
    let poller = Arc::new(EventPoller::new(
        config.poller_config(),
        source,
        engine.clone(),
    ));

    let runner = Arc::clone(&poller);
    let handle = tokio::spawn(async move { runner.start().await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down dispatcher");
    poller.stop();
    handle.await?;

    tracing::info!("Waiting for {} in-flight deliveries", engine.in_flight());
    engine.drain().await;

    let snapshot = engine.metrics().snapshot();
    tracing::info!(
        "Delivered {} webhooks ({} failed) across {} events",
        snapshot.deliveries_succeeded,
        snapshot.deliveries_failed,
        snapshot.events_triggered
    );

    Ok(())
}
