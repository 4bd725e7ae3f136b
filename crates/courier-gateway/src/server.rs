// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use courier_config::model::{QueryConfig, ServerConfig};
use courier_core::{CourierError, StorageAdapter};
use courier_webhook::{OutboundService, WebhookPipeline};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Health state for the unauthenticated health/metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

impl HealthState {
    pub fn new(prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>) -> Self {
        Self {
            start_time: Instant::now(),
            prometheus_render,
        }
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: Arc<WebhookPipeline>,
    pub outbound: Arc<OutboundService>,
    /// Store used by the history read path.
    pub store: Arc<dyn StorageAdapter>,
    /// Bound on each store call made directly by a handler.
    pub store_timeout: Duration,
    pub query: QueryConfig,
    pub health: HealthState,
}

/// Assemble the router with every route and the shared middleware stack.
pub fn build_router(state: GatewayState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .route("/webhook", post(handlers::post_webhook))
        .route("/api/messages", get(handlers::missing_counterparty))
        .route("/api/messages/", get(handlers::missing_counterparty))
        .route("/api/messages/{counterparty_id}", get(handlers::get_messages))
        .route("/api/send/session", post(handlers::post_session_message))
        .route("/api/send/template", post(handlers::post_template_message))
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
///
/// Binds to the configured host:port and serves until `shutdown` is
/// cancelled, then drains in-flight requests before returning.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), CourierError> {
    let app = build_router(state, config.request_timeout());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CourierError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!(%addr, "gateway server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| CourierError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway server stopped");
    Ok(())
}
