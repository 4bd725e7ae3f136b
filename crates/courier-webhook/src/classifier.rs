// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event classification.
//!
//! The provider's `eventType` string selects a family from [`EVENT_ALIASES`],
//! after any `_v<N>` version suffix is stripped. The generic `message` family
//! splits on the `type` content label into text and media.

use courier_core::types::EventKind;
use serde_json::Value;

/// Payload field carrying the declared event type.
pub const EVENT_TYPE_FIELD: &str = "eventType";

/// Payload field carrying the content-type label of a `message` event.
pub const CONTENT_TYPE_FIELD: &str = "type";

/// Content labels that route a `message` event to [`EventKind::IncomingMedia`].
pub const MEDIA_LABELS: &[&str] = &["image", "audio", "video", "voice", "document", "sticker"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Message,
    Kind(EventKind),
}

/// Every known event-type string. Unlisted versions resolve through the
/// suffix stripping in [`classify_event_type`].
const EVENT_ALIASES: &[(&str, Family)] = &[
    ("message", Family::Message),
    ("templateMessageSent", Family::Kind(EventKind::TemplateSent)),
    ("templateMessageSent_v2", Family::Kind(EventKind::TemplateSent)),
    ("sessionMessageSent", Family::Kind(EventKind::SessionSent)),
    ("sessionMessageSent_v2", Family::Kind(EventKind::SessionSent)),
    ("sentMessageDELIVERED", Family::Kind(EventKind::Delivered)),
    ("sentMessageDELIVERED_v2", Family::Kind(EventKind::Delivered)),
    ("sentMessageREAD", Family::Kind(EventKind::Read)),
    ("sentMessageREAD_v2", Family::Kind(EventKind::Read)),
];

/// Classify a raw webhook payload.
pub fn classify(raw: &Value) -> EventKind {
    let event_type = raw.get(EVENT_TYPE_FIELD).and_then(Value::as_str);
    let content_type = raw.get(CONTENT_TYPE_FIELD).and_then(Value::as_str);
    match event_type {
        Some(event_type) => classify_event_type(event_type, content_type),
        None => EventKind::Unhandled,
    }
}

/// Classify from the declared event type and optional content label.
pub fn classify_event_type(event_type: &str, content_type: Option<&str>) -> EventKind {
    let event_type = event_type.trim();
    let family = lookup(event_type).or_else(|| lookup(strip_version_suffix(event_type)));
    match family {
        Some(Family::Message) => {
            if content_type.is_some_and(is_media_label) {
                EventKind::IncomingMedia
            } else {
                EventKind::IncomingMessage
            }
        }
        Some(Family::Kind(kind)) => kind,
        None => EventKind::Unhandled,
    }
}

/// True when `label` names a media content type.
pub fn is_media_label(label: &str) -> bool {
    let label = label.trim();
    MEDIA_LABELS.iter().any(|m| m.eq_ignore_ascii_case(label))
}

fn lookup(event_type: &str) -> Option<Family> {
    EVENT_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(event_type))
        .map(|(_, family)| *family)
}

/// Strip a trailing `_v<digits>` version marker, if present.
fn strip_version_suffix(event_type: &str) -> &str {
    match event_type.rfind("_v") {
        Some(pos) => {
            let digits = &event_type[pos + 2..];
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                &event_type[..pos]
            } else {
                event_type
            }
        }
        None => event_type,
    }
}
