// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics adapter for Courier.
//!
//! Uses the metrics-rs facade with the Prometheus exporter. Metrics are
//! rendered as Prometheus text format via [`PrometheusAdapter::render`],
//! which the gateway exposes at `/metrics`.

pub mod recording;

use async_trait::async_trait;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use courier_core::traits::adapter::PluginAdapter;
use courier_core::types::{AdapterType, HealthStatus};
use courier_core::CourierError;

pub use recording::{
    record_anomaly, record_degraded_query, record_event, record_ingest_latency, record_outbound,
    record_timestamp_fallback,
};

/// Prometheus metrics adapter.
///
/// Installs the Prometheus recorder and exposes a handle for rendering
/// metrics in Prometheus text format.
pub struct PrometheusAdapter {
    handle: PrometheusHandle,
}

impl PrometheusAdapter {
    /// Install the Prometheus recorder globally.
    ///
    /// Only one recorder can be installed per process; a second call fails.
    pub fn new() -> Result<Self, CourierError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            CourierError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        recording::register_metrics();
        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Wrap an existing handle (used when the recorder is built elsewhere).
    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[async_trait]
impl PluginAdapter for PrometheusAdapter {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Observability
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_counters_render_with_labels() {
        // A local recorder avoids clashing with any process-global install.
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            record_event("delivered");
            record_anomaly("update_target_missing");
            record_degraded_query();
        });

        let adapter = PrometheusAdapter::from_handle(handle);
        let text = adapter.render();
        assert!(text.contains("courier_webhook_events_total{kind=\"delivered\"} 1"));
        assert!(
            text.contains("courier_webhook_anomalies_total{outcome=\"update_target_missing\"} 1")
        );
        assert!(text.contains("courier_degraded_query_total 1"));
        assert_eq!(adapter.name(), "prometheus");
        assert_eq!(adapter.adapter_type(), AdapterType::Observability);
    }

    #[test]
    #[serial_test::serial]
    fn global_recorder_installs_once() {
        let adapter = PrometheusAdapter::new().unwrap();
        record_event("incoming_message");
        assert!(adapter.render().contains("courier_webhook_events_total"));
        assert!(PrometheusAdapter::new().is_err());
    }

    #[test]
    #[serial_test::serial]
    fn recording_without_recorder_is_a_noop() {
        record_timestamp_fallback("timestamp");
        record_outbound("session", false);
        record_ingest_latency(0.01);
    }
}
