// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier serve` and `courier check-config` command implementations.
//!
//! Serve opens SQLite storage, builds the provider sender and the webhook
//! pipeline, and runs the HTTP gateway until a shutdown signal arrives.

use std::sync::Arc;

use courier_config::CourierConfig;
use courier_core::{CourierError, OutboundSender, StorageAdapter};
use courier_gateway::{GatewayState, HealthState, start_server};
use courier_prometheus::PrometheusAdapter;
use courier_provider::ProviderSender;
use courier_storage::SqliteStorage;
use courier_webhook::{OutboundService, WebhookPipeline};
use tracing::{info, warn};

use crate::shutdown;

/// Runs the `courier serve` command.
pub async fn run_serve(config: CourierConfig) -> Result<(), CourierError> {
    init_tracing(&config.service.log_level);

    info!(service = %config.service.name, "starting courier serve");

    let prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>> =
        if config.prometheus.enabled {
            let adapter = PrometheusAdapter::new()?;
            Some(Arc::new(move || adapter.render()))
        } else {
            None
        };

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    info!(path = %config.storage.database_path, "storage initialized");
    let store: Arc<dyn StorageAdapter> = storage;

    let sender: Arc<dyn OutboundSender> = Arc::new(ProviderSender::new(&config.provider)?);

    let store_timeout = config.storage.call_timeout();
    let pipeline = Arc::new(WebhookPipeline::new(store.clone(), store_timeout));
    let outbound = Arc::new(OutboundService::new(
        sender,
        store.clone(),
        config.provider.call_timeout(),
        store_timeout,
    ));

    let state = GatewayState {
        pipeline,
        outbound,
        store: store.clone(),
        store_timeout,
        query: config.query.clone(),
        health: HealthState::new(prometheus_render),
    };

    let cancel = shutdown::install_signal_handler();
    let served = start_server(&config.server, state, cancel).await;

    if let Err(e) = store.close().await {
        warn!(error = %e, "storage close failed");
    }
    info!("courier serve stopped");
    served
}

/// Runs the `courier check-config` command.
pub fn check_config(config: &CourierConfig) -> Result<(), CourierError> {
    println!("configuration is valid\n");
    print!("{}", render_masked(config)?);
    Ok(())
}

/// Render the effective configuration as TOML with secrets masked.
fn render_masked(config: &CourierConfig) -> Result<String, CourierError> {
    let mut masked = config.clone();
    if masked.provider.api_token.is_some() {
        masked.provider.api_token = Some("[redacted]".to_string());
    }
    toml::to_string_pretty(&masked)
        .map_err(|e| CourierError::Internal(format!("failed to render configuration: {e}")))
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("courier={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
