// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock outbound sender for deterministic testing.
//!
//! `MockSender` implements `OutboundSender` with pre-configured replies and
//! captures every request it receives.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;

use courier_core::traits::adapter::PluginAdapter;
use courier_core::traits::sender::OutboundSender;
use courier_core::types::{
    AdapterType, HealthStatus, SendReceipt, SessionMessageRequest, TemplateMessageRequest,
};
use courier_core::CourierError;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Accept, returning this provider id (or none).
    Accept(Option<String>),
    /// Reject with this HTTP status and detail.
    Reject { status: u16, detail: String },
    /// Never answer, so the caller's timeout fires.
    Hang,
}

/// A mock sender that pops replies from a FIFO queue.
///
/// When the queue is empty, sends are accepted with a provider id of the
/// form `mock-<n>`.
pub struct MockSender {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    sessions: Arc<Mutex<Vec<SessionMessageRequest>>>,
    templates: Arc<Mutex<Vec<TemplateMessageRequest>>>,
}

impl MockSender {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            sessions: Arc::new(Mutex::new(Vec::new())),
            templates: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock sender pre-loaded with the given replies.
    pub fn with_replies(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            ..Self::new()
        }
    }

    /// Add a reply to the end of the queue.
    pub async fn add_reply(&self, reply: MockReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Session requests received so far.
    pub async fn sent_sessions(&self) -> Vec<SessionMessageRequest> {
        self.sessions.lock().await.clone()
    }

    /// Template requests received so far.
    pub async fn sent_templates(&self) -> Vec<TemplateMessageRequest> {
        self.templates.lock().await.clone()
    }

    async fn next_reply(&self) -> MockReply {
        let sent = self.sessions.lock().await.len() + self.templates.lock().await.len();
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockReply::Accept(Some(format!("mock-{sent}"))))
    }

    async fn answer(reply: MockReply) -> Result<SendReceipt, CourierError> {
        match reply {
            MockReply::Accept(message_id) => Ok(SendReceipt {
                raw: json!({"result": true, "message": {"id": message_id}}),
                message_id,
            }),
            MockReply::Reject { status, detail } => Err(CourierError::OutboundSendFailed {
                message: format!("provider returned {status}"),
                status: Some(status),
                detail: Some(detail),
            }),
            MockReply::Hang => std::future::pending().await,
        }
    }
}

impl Default for MockSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockSender {
    fn name(&self) -> &str {
        "mock"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Sender
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        Ok(())
    }
}

#[async_trait]
impl OutboundSender for MockSender {
    async fn send_session_message(
        &self,
        request: &SessionMessageRequest,
    ) -> Result<SendReceipt, CourierError> {
        let reply = self.next_reply().await;
        self.sessions.lock().await.push(request.clone());
        Self::answer(reply).await
    }

    async fn send_template_message(
        &self,
        request: &TemplateMessageRequest,
    ) -> Result<SendReceipt, CourierError> {
        let reply = self.next_reply().await;
        self.templates.lock().await.push(request.clone());
        Self::answer(reply).await
    }
}
