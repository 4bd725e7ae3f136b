// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical types shared across the pipeline, storage, and HTTP layers.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Sender,
    Observability,
}

/// Origin and shape of a conversation message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageKind {
    Incoming,
    Template,
    Session,
    Media,
}

impl MessageKind {
    /// Direction implied by the kind: provider-sent kinds are outgoing.
    pub fn direction(self) -> Direction {
        match self {
            MessageKind::Incoming | MessageKind::Media => Direction::Incoming,
            MessageKind::Template | MessageKind::Session => Direction::Outgoing,
        }
    }
}

/// Delivery state of a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MessageStatus {
    Received,
    Sent,
    Delivered,
    Read,
    Failed,
    Unhandled,
}

/// Which side of the conversation a message came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

/// Attachment reference carried by a media message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    pub caption: String,
    pub attachment_id: String,
    /// Content-type label reported by the provider (image, audio, ...).
    pub mime_kind: String,
    pub source_url: String,
}

/// Canonical, idempotently keyed representation of one conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    /// Provider-assigned id. `None` asks the store to assign one on upsert.
    pub id: Option<String>,
    pub counterparty_id: String,
    pub text: Option<String>,
    pub kind: MessageKind,
    pub media_info: Option<MediaInfo>,
    pub status: MessageStatus,
    pub direction: Direction,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub delivered_at: Option<i64>,
    pub read_at: Option<i64>,
    /// Opaque copy of the originating event.
    pub raw_event: serde_json::Value,
}

/// Partial field set merged onto an existing message record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePatch {
    pub status: Option<MessageStatus>,
    pub delivered_at: Option<i64>,
    pub read_at: Option<i64>,
}

/// Attachment entity stored alongside a media message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub attachment_id: String,
    /// Owning message id.
    pub message_id: String,
    pub caption: String,
    pub source_url: String,
    pub mime_kind: String,
    pub timestamp: i64,
}

/// Canonical classification of an inbound webhook payload.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    IncomingMessage,
    IncomingMedia,
    TemplateSent,
    SessionSent,
    Delivered,
    Read,
    Unhandled,
}

/// How a ledgered event was handled.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProcessingOutcome {
    /// A message record was created or replaced.
    Stored,
    /// An existing message record received a status update.
    Updated,
    /// The message was stored but its attachment entity was not.
    MediaInsertFailed,
    /// The event type is outside the known set.
    Unhandled,
    MalformedEvent,
    UpdateTargetMissing,
}

impl ProcessingOutcome {
    /// Anomalies are acknowledged but worth alerting on.
    pub fn is_anomaly(self) -> bool {
        matches!(
            self,
            ProcessingOutcome::MediaInsertFailed
                | ProcessingOutcome::MalformedEvent
                | ProcessingOutcome::UpdateTargetMissing
        )
    }
}

/// Outcome descriptor written once onto a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub kind: EventKind,
    pub outcome: ProcessingOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// One raw inbound event plus its processing state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: String,
    pub raw_event: serde_json::Value,
    /// Ingestion instant in epoch milliseconds.
    pub received_at: i64,
    pub processed: bool,
    pub processing_result: Option<ProcessingResult>,
}

/// Which end of a counterparty's history a bounded read keeps.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    /// Oldest `limit` records.
    Asc,
    /// Newest `limit` records.
    #[default]
    Desc,
}

/// Free-form session message to a counterparty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMessageRequest {
    pub wa_id: String,
    pub text: String,
}

/// Named template parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateParameter {
    pub name: String,
    pub value: String,
}

/// Pre-approved template message to a counterparty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMessageRequest {
    pub wa_id: String,
    pub template_name: String,
    pub broadcast_name: String,
    pub parameters: Vec<TemplateParameter>,
}

/// Successful send acknowledgement from the messaging provider.
#[derive(Debug, Clone, PartialEq)]
pub struct SendReceipt {
    /// Provider-assigned message id, when the provider returned one.
    pub message_id: Option<String>,
    /// Raw provider response body.
    pub raw: serde_json::Value,
}
