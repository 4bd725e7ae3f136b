// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the provider's send-message API.

use serde::Serialize;
use serde_json::Value;

use courier_core::types::TemplateParameter;

/// Body of a template send.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateMessageBody<'a> {
    pub template_name: &'a str,
    pub broadcast_name: &'a str,
    pub parameters: &'a [TemplateParameter],
}

/// A parsed provider reply.
#[derive(Debug, Clone, PartialEq)]
pub struct SendResponse {
    pub body: Value,
}

impl SendResponse {
    /// The provider signals rejection in-band with `result: false`.
    pub fn accepted(&self) -> bool {
        self.body.get("result").and_then(Value::as_bool) != Some(false)
    }

    /// Provider message id, from the most specific location that has one.
    pub fn message_id(&self) -> Option<String> {
        let candidates = [
            self.body.pointer("/message/whatsappMessageId"),
            self.body.pointer("/message/id"),
            self.body.pointer("/model/ids/0"),
            self.body.get("id"),
        ];
        candidates.into_iter().flatten().find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// Human-readable failure detail from the reply.
    pub fn detail(&self) -> String {
        match self.body.get("info").and_then(Value::as_str) {
            Some(info) if !info.is_empty() => info.to_string(),
            _ => match &self.body {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        }
    }
}
