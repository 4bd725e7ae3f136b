// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics. With no recorder installed every call is a no-op.

use metrics::{describe_counter, describe_histogram};

pub const WEBHOOK_EVENTS: &str = "courier_webhook_events_total";
pub const WEBHOOK_ANOMALIES: &str = "courier_webhook_anomalies_total";
pub const TIMESTAMP_FALLBACKS: &str = "courier_timestamp_fallback_total";
pub const DEGRADED_QUERIES: &str = "courier_degraded_query_total";
pub const OUTBOUND_SENDS: &str = "courier_outbound_sends_total";
pub const INGEST_LATENCY: &str = "courier_webhook_ingest_seconds";

/// Register all Courier metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(WEBHOOK_EVENTS, "Inbound webhook events by classified kind");
    describe_counter!(
        WEBHOOK_ANOMALIES,
        "Acknowledged webhook events that could not be fully applied"
    );
    describe_counter!(
        TIMESTAMP_FALLBACKS,
        "Timestamps defaulted to ingestion time because the payload value was unusable"
    );
    describe_counter!(
        DEGRADED_QUERIES,
        "History reads served by the filter-only fallback path"
    );
    describe_counter!(OUTBOUND_SENDS, "Outbound provider sends by kind and result");
    describe_histogram!(INGEST_LATENCY, "End-to-end webhook ingestion latency in seconds");
}

/// Record a classified inbound event.
pub fn record_event(kind: &str) {
    metrics::counter!(WEBHOOK_EVENTS, "kind" => kind.to_string()).increment(1);
}

/// Record an acknowledged anomaly (malformed event, missing update target, ...).
pub fn record_anomaly(outcome: &str) {
    metrics::counter!(WEBHOOK_ANOMALIES, "outcome" => outcome.to_string()).increment(1);
}

/// Record a timestamp that fell back to "now".
pub fn record_timestamp_fallback(field: &str) {
    metrics::counter!(TIMESTAMP_FALLBACKS, "field" => field.to_string()).increment(1);
}

/// Record a read served by the degraded path.
pub fn record_degraded_query() {
    metrics::counter!(DEGRADED_QUERIES).increment(1);
}

/// Record an outbound send attempt.
pub fn record_outbound(kind: &str, ok: bool) {
    let result = if ok { "ok" } else { "error" };
    metrics::counter!(OUTBOUND_SENDS, "kind" => kind.to_string(), "result" => result)
        .increment(1);
}

/// Record ingestion latency.
pub fn record_ingest_latency(seconds: f64) {
    metrics::histogram!(INGEST_LATENCY).record(seconds);
}
