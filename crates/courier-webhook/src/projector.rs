// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record projection: raw payload plus classified kind into a store operation.
//!
//! Each [`EventKind`] has one projector in [`PROJECTORS`]. Field fallbacks are
//! ordered lists so each tier stays independently testable.

use courier_core::types::{
    Attachment, Direction, EventKind, MediaInfo, MessageKind, MessagePatch, MessageRecord,
    MessageStatus,
};
use courier_core::CourierError;
use serde_json::Value;
use tracing::warn;
use url::Url;

use crate::classifier::CONTENT_TYPE_FIELD;
use crate::timestamp::normalize_field;

/// Base used to resolve relative media paths before extracting a filename.
const RELATIVE_MEDIA_BASE: &str = "https://media.invalid/";

/// Query parameters that carry the media filename.
const FILENAME_PARAMS: &[&str] = &["fileName", "filename", "file"];

/// Status fields on provider-sent events, most specific first.
const STATUS_FIELDS: &[&str] = &["statusString", "status"];

/// Timestamp fields for template sends: creation time, then event time.
const TEMPLATE_TIME_FIELDS: &[&str] = &["created", "timestamp"];

/// Timestamp fields for session sends: event time, then creation time.
const SESSION_TIME_FIELDS: &[&str] = &["timestamp", "created"];

/// Whether a projection creates or updates its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOperation {
    CreateOrReplace,
    UpdateExisting,
}

/// The store operation an event projects to.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// Create or fully replace a record, plus an optional attachment entity.
    Create {
        record: MessageRecord,
        attachment: Option<Attachment>,
    },
    /// Merge a patch onto an existing record.
    Update { id: String, patch: MessagePatch },
    /// Nothing to persist beyond the ledger entry.
    Skip,
}

impl Projection {
    pub fn operation(&self) -> Option<RecordOperation> {
        match self {
            Projection::Create { .. } => Some(RecordOperation::CreateOrReplace),
            Projection::Update { .. } => Some(RecordOperation::UpdateExisting),
            Projection::Skip => None,
        }
    }
}

type Projector = fn(&Value, i64) -> Result<Projection, CourierError>;

/// Single dispatch point from event kind to projector.
const PROJECTORS: &[(EventKind, Projector)] = &[
    (EventKind::IncomingMessage, project_incoming_message),
    (EventKind::IncomingMedia, project_incoming_media),
    (EventKind::TemplateSent, project_template_sent),
    (EventKind::SessionSent, project_session_sent),
    (EventKind::Delivered, project_delivered),
    (EventKind::Read, project_read),
    (EventKind::Unhandled, project_unhandled),
];

/// Project `raw` as `kind`. `now_ms` is the fallback instant for timestamps.
///
/// Fails with [`CourierError::MalformedEvent`] when a field the kind requires
/// is absent.
pub fn project(kind: EventKind, raw: &Value, now_ms: i64) -> Result<Projection, CourierError> {
    match PROJECTORS.iter().find(|(k, _)| *k == kind) {
        Some((_, projector)) => projector(raw, now_ms),
        None => Ok(Projection::Skip),
    }
}

fn project_incoming_message(raw: &Value, now_ms: i64) -> Result<Projection, CourierError> {
    let record = incoming_record(raw, EventKind::IncomingMessage, MessageKind::Incoming, now_ms)?;
    Ok(Projection::Create {
        record,
        attachment: None,
    })
}

fn project_incoming_media(raw: &Value, now_ms: i64) -> Result<Projection, CourierError> {
    let mut record = incoming_record(raw, EventKind::IncomingMedia, MessageKind::Media, now_ms)?;
    let message_id = record.id.clone().unwrap_or_default();

    let mime_kind = string_field(raw, CONTENT_TYPE_FIELD)
        .map(|label| label.to_ascii_lowercase())
        .unwrap_or_default();
    let source_url = resolve_source_url(raw, &mime_kind);
    let attachment_id = attachment_id_from_url(&source_url)
        .unwrap_or_else(|| placeholder_attachment_id(&message_id));
    let caption = resolve_caption(raw, &mime_kind);

    let attachment = Attachment {
        attachment_id: attachment_id.clone(),
        message_id,
        caption: caption.clone(),
        source_url: source_url.clone(),
        mime_kind: mime_kind.clone(),
        timestamp: record.timestamp,
    };
    record.media_info = Some(MediaInfo {
        caption,
        attachment_id,
        mime_kind,
        source_url,
    });
    Ok(Projection::Create {
        record,
        attachment: Some(attachment),
    })
}

fn project_template_sent(raw: &Value, now_ms: i64) -> Result<Projection, CourierError> {
    let record = outgoing_record(
        raw,
        EventKind::TemplateSent,
        MessageKind::Template,
        TEMPLATE_TIME_FIELDS,
        now_ms,
    )?;
    Ok(Projection::Create {
        record,
        attachment: None,
    })
}

fn project_session_sent(raw: &Value, now_ms: i64) -> Result<Projection, CourierError> {
    let record = outgoing_record(
        raw,
        EventKind::SessionSent,
        MessageKind::Session,
        SESSION_TIME_FIELDS,
        now_ms,
    )?;
    Ok(Projection::Create {
        record,
        attachment: None,
    })
}

/// Status timestamps go through the same magnitude rule as every other
/// event time: 13-digit values are taken as milliseconds and 10-digit values
/// as seconds. Providers mix the two, so seconds are not assumed.
fn project_delivered(raw: &Value, now_ms: i64) -> Result<Projection, CourierError> {
    let id = required(raw, "id", EventKind::Delivered)?;
    let delivered_at = normalize_field(field(raw, "timestamp"), "timestamp", now_ms);
    Ok(Projection::Update {
        id,
        patch: MessagePatch {
            status: Some(MessageStatus::Delivered),
            delivered_at: Some(delivered_at),
            read_at: None,
        },
    })
}

fn project_read(raw: &Value, now_ms: i64) -> Result<Projection, CourierError> {
    let id = required(raw, "id", EventKind::Read)?;
    let read_at = normalize_field(field(raw, "timestamp"), "timestamp", now_ms);
    Ok(Projection::Update {
        id,
        patch: MessagePatch {
            status: Some(MessageStatus::Read),
            delivered_at: None,
            read_at: Some(read_at),
        },
    })
}

fn project_unhandled(_raw: &Value, _now_ms: i64) -> Result<Projection, CourierError> {
    Ok(Projection::Skip)
}

fn incoming_record(
    raw: &Value,
    event: EventKind,
    kind: MessageKind,
    now_ms: i64,
) -> Result<MessageRecord, CourierError> {
    let id = required(raw, "id", event)?;
    let counterparty_id = required(raw, "waId", event)?;
    Ok(MessageRecord {
        id: Some(id),
        counterparty_id,
        text: string_field(raw, "text"),
        kind,
        media_info: None,
        status: MessageStatus::Received,
        direction: kind.direction(),
        timestamp: normalize_field(field(raw, "timestamp"), "timestamp", now_ms),
        delivered_at: None,
        read_at: None,
        raw_event: raw.clone(),
    })
}

fn outgoing_record(
    raw: &Value,
    event: EventKind,
    kind: MessageKind,
    time_fields: &[&str],
    now_ms: i64,
) -> Result<MessageRecord, CourierError> {
    let counterparty_id = required(raw, "waId", event)?;
    let (time_field, time_value) = time_fields
        .iter()
        .find_map(|name| raw.get(*name).filter(|v| !v.is_null()).map(|v| (*name, v)))
        .unwrap_or((time_fields.first().copied().unwrap_or("timestamp"), &Value::Null));
    Ok(MessageRecord {
        id: string_field(raw, "id"),
        counterparty_id,
        text: string_field(raw, "text"),
        kind,
        media_info: None,
        status: provider_status(raw),
        direction: Direction::Outgoing,
        timestamp: normalize_field(time_value, time_field, now_ms),
        delivered_at: None,
        read_at: None,
        raw_event: raw.clone(),
    })
}

/// Provider status string on a sent event, lower-cased; `sent` when absent.
///
/// Strings outside the known statuses are kept as `sent`.
pub fn provider_status(raw: &Value) -> MessageStatus {
    let Some(status) = STATUS_FIELDS.iter().find_map(|f| string_field(raw, f)) else {
        return MessageStatus::Sent;
    };
    match status.to_ascii_lowercase().parse::<MessageStatus>() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!(status = %status, "unrecognized provider status, recording as sent");
            MessageStatus::Sent
        }
    }
}

/// Attachment id from a media URL: the filename query parameter, then the
/// final path segment.
pub fn attachment_id_from_url(source_url: &str) -> Option<String> {
    let source_url = source_url.trim();
    if source_url.is_empty() {
        return None;
    }
    let base = Url::parse(RELATIVE_MEDIA_BASE).ok()?;
    let parsed = base.join(source_url).ok()?;

    let from_query = parsed
        .query_pairs()
        .find(|(key, _)| FILENAME_PARAMS.iter().any(|param| *param == &**key))
        .and_then(|(_, value)| last_segment(&value));
    if from_query.is_some() {
        return from_query;
    }

    parsed
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(str::to_string)
}

fn last_segment(value: &str) -> Option<String> {
    value
        .rsplit('/')
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Deterministic attachment id used when the URL yields no filename.
pub fn placeholder_attachment_id(message_id: &str) -> String {
    format!("media-{message_id}")
}

/// Caption from the type-specific sub-object, then the top-level text, else empty.
pub fn resolve_caption(raw: &Value, mime_kind: &str) -> String {
    raw.get(mime_kind)
        .and_then(|sub| string_field(sub, "caption"))
        .or_else(|| string_field(raw, "text"))
        .unwrap_or_default()
}

/// Media URL from `data`, then the type-specific sub-object's `url`.
pub fn resolve_source_url(raw: &Value, mime_kind: &str) -> String {
    string_field(raw, "data")
        .or_else(|| raw.get(mime_kind).and_then(|sub| string_field(sub, "url")))
        .unwrap_or_default()
}

fn field<'a>(raw: &'a Value, name: &str) -> &'a Value {
    raw.get(name).unwrap_or(&Value::Null)
}

/// Non-blank string (or number rendered as a string) at `name`.
fn string_field(raw: &Value, name: &str) -> Option<String> {
    match raw.get(name)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required(raw: &Value, name: &str, kind: EventKind) -> Result<String, CourierError> {
    string_field(raw, name).ok_or_else(|| CourierError::MalformedEvent {
        kind: kind.to_string(),
        reason: format!("missing required field `{name}`"),
    })
}
