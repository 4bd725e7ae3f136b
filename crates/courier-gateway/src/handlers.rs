// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway.
//!
//! Handles POST /webhook, GET /api/messages/{counterpartyId}, the outbound
//! send endpoints, GET /health, and GET /metrics.

use std::str::FromStr;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use courier_core::types::{
    Direction, EventKind, HealthStatus, MediaInfo, MessageKind, MessageRecord, MessageStatus,
    ProcessingResult, SessionMessageRequest, SortOrder, TemplateMessageRequest,
    TemplateParameter,
};
use courier_core::CourierError;
use courier_webhook::bounded;

use crate::server::GatewayState;

/// Response body for POST /webhook.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub success: bool,
    /// Ledger id of the received event.
    pub event_id: String,
    pub kind: EventKind,
    pub result: ProcessingResult,
}

/// Query string for the history read.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub order: Option<String>,
}

/// Client-facing projection of a Message Record.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecordView {
    pub id: Option<String>,
    pub text: Option<String>,
    pub direction: Direction,
    pub status: MessageStatus,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// ISO-8601 rendering of `timestamp`.
    pub formatted_date: Option<String>,
    pub counterparty_id: String,
    pub kind: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_info: Option<MediaInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<i64>,
}

impl From<MessageRecord> for MessageRecordView {
    fn from(record: MessageRecord) -> Self {
        Self {
            formatted_date: format_millis(record.timestamp),
            id: record.id,
            text: record.text,
            direction: record.direction,
            status: record.status,
            timestamp: record.timestamp,
            counterparty_id: record.counterparty_id,
            kind: record.kind,
            media_info: record.media_info,
            delivered_at: record.delivered_at,
            read_at: record.read_at,
        }
    }
}

/// Request body for POST /api/send/session.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSendBody {
    pub wa_id: String,
    pub text: String,
}

/// Request body for POST /api/send/template.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateSendBody {
    pub wa_id: String,
    pub template_name: String,
    pub broadcast_name: String,
    pub parameters: Vec<TemplateParameter>,
}

/// Response body for a successful outbound send.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub success: bool,
    pub message_id: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// "ok", "degraded", or "unhealthy".
    pub status: String,
    /// Binary version.
    pub version: String,
    pub uptime_secs: u64,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    detail: Option<String>,
) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            detail,
        }),
    )
        .into_response()
}

fn server_error(err: &CourierError) -> Response {
    let detail = match err {
        CourierError::OutboundSendFailed { detail, .. } => detail.clone(),
        _ => None,
    };
    error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), detail)
}

fn format_millis(millis: i64) -> Option<String> {
    DateTime::from_timestamp_millis(millis)
        .map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// POST /webhook
///
/// Ledgers and processes one provider event. The body is read as raw bytes
/// so that events with a missing content type or an unparseable payload are
/// still ledgered: non-JSON bodies are kept as a JSON string and classify as
/// unhandled. Every classified outcome is acknowledged with 200; only store
/// failures and timeouts return 500.
pub async fn post_webhook(State(state): State<GatewayState>, body: Bytes) -> Response {
    match state.pipeline.ingest(raw_event(&body)).await {
        Ok(report) => (
            StatusCode::OK,
            Json(WebhookResponse {
                success: true,
                event_id: report.ledger_id,
                kind: report.kind,
                result: report.result,
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "webhook processing failed");
            server_error(&err)
        }
    }
}

/// Decode a webhook body, keeping anything that is not JSON verbatim.
fn raw_event(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, bytes = body.len(), "webhook body is not JSON");
            Value::String(String::from_utf8_lossy(body).into_owned())
        }
    }
}

/// GET /api/messages/{counterpartyId}
///
/// Returns the counterparty's history ascending by timestamp.
pub async fn get_messages(
    State(state): State<GatewayState>,
    Path(counterparty_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Response {
    let counterparty_id = counterparty_id.trim();
    if counterparty_id.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "counterparty id is required", None);
    }

    let order = match params.order.as_deref().map(str::trim) {
        None | Some("") => SortOrder::default(),
        Some(raw) => match SortOrder::from_str(raw) {
            Ok(order) => order,
            Err(_) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("invalid order `{raw}`, expected asc or desc"),
                    None,
                );
            }
        },
    };
    let limit = state.query.effective_limit(params.limit);

    let read = state.store.query_by_counterparty(counterparty_id, order, limit);
    match bounded(state.store_timeout, read).await {
        Ok(records) => {
            let views: Vec<MessageRecordView> = records.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, counterparty_id, "history read failed");
            server_error(&err)
        }
    }
}

/// GET /api/messages with no counterparty segment.
pub async fn missing_counterparty() -> Response {
    error_response(StatusCode::BAD_REQUEST, "counterparty id is required", None)
}

/// POST /api/send/session
pub async fn post_session_message(
    State(state): State<GatewayState>,
    Json(body): Json<SessionSendBody>,
) -> Response {
    if body.wa_id.trim().is_empty() || body.text.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "waId and text are required", None);
    }

    let request = SessionMessageRequest {
        wa_id: body.wa_id.trim().to_string(),
        text: body.text,
    };
    send_result(state.outbound.send_session(&request).await)
}

/// POST /api/send/template
pub async fn post_template_message(
    State(state): State<GatewayState>,
    Json(body): Json<TemplateSendBody>,
) -> Response {
    if [&body.wa_id, &body.template_name, &body.broadcast_name]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return error_response(
            StatusCode::BAD_REQUEST,
            "waId, templateName and broadcastName are required",
            None,
        );
    }

    let request = TemplateMessageRequest {
        wa_id: body.wa_id.trim().to_string(),
        template_name: body.template_name,
        broadcast_name: body.broadcast_name,
        parameters: body.parameters,
    };
    send_result(state.outbound.send_template(&request).await)
}

fn send_result(result: Result<String, CourierError>) -> Response {
    match result {
        Ok(message_id) => (
            StatusCode::OK,
            Json(SendResponse {
                success: true,
                message_id,
            }),
        )
            .into_response(),
        Err(err) => server_error(&err),
    }
}

/// GET /health
///
/// A degraded store still serves traffic and answers 200. An unhealthy or
/// unreachable store answers 503.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let (status, label) = match bounded(state.store_timeout, state.store.health_check()).await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "ok"),
        Ok(HealthStatus::Degraded(reason)) => {
            tracing::warn!(%reason, "store degraded");
            (StatusCode::OK, "degraded")
        }
        Ok(HealthStatus::Unhealthy(reason)) => {
            tracing::warn!(%reason, "store unhealthy");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
        Err(err) => {
            tracing::warn!(error = %err, "store health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: state.health.start_time.elapsed().as_secs(),
        }),
    )
        .into_response()
}

/// GET /metrics
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
