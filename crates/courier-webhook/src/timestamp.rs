// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamp normalization for heterogeneous provider payloads.
//!
//! Every input resolves to epoch milliseconds. Rules apply in order:
//!
//! 1. Provider-native timestamp objects (`{seconds, nanoseconds}` or the
//!    underscore-prefixed variants) convert directly.
//! 2. Numbers and numeric strings above [`MILLIS_BOUNDARY`] are milliseconds,
//!    otherwise seconds.
//! 3. Other strings parse as calendar timestamps (RFC 3339 or naive UTC).
//! 4. Anything else falls back to the current instant.
//!
//! The fallback is lossy: the event keeps its place in history at ingestion
//! time instead of failing. [`normalize_field`] logs and counts each fallback.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::warn;

/// Largest magnitude still read as epoch seconds (ten digits).
pub const MILLIS_BOUNDARY: i64 = 9_999_999_999;

/// Naive calendar layouts accepted after RFC 3339, interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Conversion into epoch milliseconds for timestamp types that carry one.
pub trait IntoEpochMillis {
    fn epoch_millis(&self) -> i64;
}

impl IntoEpochMillis for DateTime<Utc> {
    fn epoch_millis(&self) -> i64 {
        self.timestamp_millis()
    }
}

/// A provider-native timestamp split into seconds and nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeTimestamp {
    pub seconds: i64,
    pub nanoseconds: i64,
}

impl NativeTimestamp {
    /// Recognize a native timestamp object in a JSON payload.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let seconds = obj
            .get("seconds")
            .or_else(|| obj.get("_seconds"))
            .and_then(Value::as_i64)?;
        let nanoseconds = obj
            .get("nanoseconds")
            .or_else(|| obj.get("_nanoseconds"))
            .and_then(Value::as_i64)
            .unwrap_or(0);
        Some(Self {
            seconds,
            nanoseconds,
        })
    }
}

impl IntoEpochMillis for NativeTimestamp {
    fn epoch_millis(&self) -> i64 {
        self.seconds
            .saturating_mul(1000)
            .saturating_add(self.nanoseconds / 1_000_000)
    }
}

/// Which rule produced a normalized timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSource {
    Native,
    EpochMillis,
    EpochSeconds,
    Calendar,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedTimestamp {
    pub millis: i64,
    pub source: TimestampSource,
}

impl NormalizedTimestamp {
    fn new(millis: i64, source: TimestampSource) -> Self {
        Self { millis, source }
    }
}

/// Current instant in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Normalize `value` against the current clock.
pub fn normalize(value: &Value) -> i64 {
    normalize_field(value, "timestamp", now_millis())
}

/// Normalize the payload field `field`, warning and counting on fallback.
pub fn normalize_field(value: &Value, field: &str, now_ms: i64) -> i64 {
    let resolved = resolve(value, now_ms);
    if resolved.source == TimestampSource::Fallback {
        warn!(
            field,
            value = %value,
            fallback_ms = now_ms,
            "unrecognized timestamp, defaulting to ingestion time"
        );
        courier_prometheus::record_timestamp_fallback(field);
    }
    resolved.millis
}

/// Resolve `value` to epoch milliseconds, reporting which rule applied.
///
/// Never fails: unrecognized input resolves to `now_ms` with
/// [`TimestampSource::Fallback`].
pub fn resolve(value: &Value, now_ms: i64) -> NormalizedTimestamp {
    let fallback = NormalizedTimestamp::new(now_ms, TimestampSource::Fallback);
    match value {
        Value::Object(_) => NativeTimestamp::from_json(value)
            .map(|ts| NormalizedTimestamp::new(ts.epoch_millis(), TimestampSource::Native))
            .unwrap_or(fallback),
        Value::Number(n) => {
            let parsed = match n.as_i64() {
                Some(i) => from_epoch_int(i),
                None => n.as_f64().and_then(from_epoch_float),
            };
            parsed.unwrap_or(fallback)
        }
        Value::String(s) => resolve_str(s.trim()).unwrap_or(fallback),
        _ => fallback,
    }
}

fn resolve_str(s: &str) -> Option<NormalizedTimestamp> {
    if s.is_empty() {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return from_epoch_int(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return from_epoch_float(f);
    }
    parse_calendar(s).map(|ms| NormalizedTimestamp::new(ms, TimestampSource::Calendar))
}

fn from_epoch_int(value: i64) -> Option<NormalizedTimestamp> {
    if value.unsigned_abs() > MILLIS_BOUNDARY.unsigned_abs() {
        Some(NormalizedTimestamp::new(value, TimestampSource::EpochMillis))
    } else {
        value
            .checked_mul(1000)
            .map(|ms| NormalizedTimestamp::new(ms, TimestampSource::EpochSeconds))
    }
}

fn from_epoch_float(value: f64) -> Option<NormalizedTimestamp> {
    if !value.is_finite() {
        return None;
    }
    let (millis, source) = if value.abs() > MILLIS_BOUNDARY as f64 {
        (value, TimestampSource::EpochMillis)
    } else {
        (value * 1000.0, TimestampSource::EpochSeconds)
    };
    let millis = millis.round();
    if millis < i64::MIN as f64 || millis > i64::MAX as f64 {
        return None;
    }
    Some(NormalizedTimestamp::new(millis as i64, source))
}

fn parse_calendar(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc().timestamp_millis())
}
