// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound sends that are recorded into conversation history.
//!
//! A send that the provider accepts becomes an outgoing message record keyed
//! by the provider message id. A failed send records nothing.

use std::sync::Arc;
use std::time::Duration;

use courier_core::types::{
    Direction, MessageKind, MessageRecord, MessageStatus, SendReceipt, SessionMessageRequest,
    TemplateMessageRequest,
};
use courier_core::{CourierError, OutboundSender, StorageAdapter};
use tracing::{info, warn};

use crate::pipeline::bounded;
use crate::timestamp::now_millis;

pub struct OutboundService {
    sender: Arc<dyn OutboundSender>,
    store: Arc<dyn StorageAdapter>,
    send_timeout: Duration,
    store_timeout: Duration,
}

impl OutboundService {
    pub fn new(
        sender: Arc<dyn OutboundSender>,
        store: Arc<dyn StorageAdapter>,
        send_timeout: Duration,
        store_timeout: Duration,
    ) -> Self {
        Self {
            sender,
            store,
            send_timeout,
            store_timeout,
        }
    }

    /// Send a session message and record it. Returns the stored message id.
    pub async fn send_session(
        &self,
        request: &SessionMessageRequest,
    ) -> Result<String, CourierError> {
        let sent = bounded(self.send_timeout, self.sender.send_session_message(request)).await;
        let receipt = Self::observe(MessageKind::Session, &request.wa_id, sent)?;
        self.record(
            MessageKind::Session,
            &request.wa_id,
            Some(request.text.clone()),
            receipt,
        )
        .await
    }

    /// Send a template message and record it. Returns the stored message id.
    pub async fn send_template(
        &self,
        request: &TemplateMessageRequest,
    ) -> Result<String, CourierError> {
        let sent = bounded(self.send_timeout, self.sender.send_template_message(request)).await;
        let receipt = Self::observe(MessageKind::Template, &request.wa_id, sent)?;
        self.record(MessageKind::Template, &request.wa_id, None, receipt).await
    }

    fn observe(
        kind: MessageKind,
        wa_id: &str,
        sent: Result<SendReceipt, CourierError>,
    ) -> Result<SendReceipt, CourierError> {
        let kind_label = kind.to_string();
        courier_prometheus::record_outbound(&kind_label, sent.is_ok());
        if let Err(e) = &sent {
            warn!(kind = %kind_label, counterparty_id = wa_id, error = %e, "outbound send failed");
        }
        sent
    }

    async fn record(
        &self,
        kind: MessageKind,
        wa_id: &str,
        text: Option<String>,
        receipt: SendReceipt,
    ) -> Result<String, CourierError> {
        let id = receipt
            .message_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let record = MessageRecord {
            id: Some(id),
            counterparty_id: wa_id.to_string(),
            text,
            kind,
            media_info: None,
            status: MessageStatus::Sent,
            direction: Direction::Outgoing,
            timestamp: now_millis(),
            delivered_at: None,
            read_at: None,
            raw_event: receipt.raw,
        };
        let id = bounded(self.store_timeout, self.store.upsert_message(&record)).await?;
        info!(kind = %kind, message_id = %id, counterparty_id = wa_id, "outbound message recorded");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use courier_config::model::StorageConfig;
    use courier_core::types::{AdapterType, HealthStatus, TemplateParameter};
    use courier_core::{MessageStore, PluginAdapter};
    use courier_storage::SqliteStorage;
    use serde_json::json;
    use tempfile::tempdir;

    /// Replies with a fixed outcome.
    struct StubSender {
        message_id: Option<String>,
        fail: bool,
    }

    impl StubSender {
        fn reply(&self) -> Result<SendReceipt, CourierError> {
            if self.fail {
                return Err(CourierError::OutboundSendFailed {
                    message: "rejected".to_string(),
                    status: Some(400),
                    detail: Some("invalid number".to_string()),
                });
            }
            Ok(SendReceipt {
                message_id: self.message_id.clone(),
                raw: json!({"result": true}),
            })
        }
    }

    #[async_trait]
    impl PluginAdapter for StubSender {
        fn name(&self) -> &str {
            "stub"
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
    impl OutboundSender for StubSender {
        async fn send_session_message(
            &self,
            _request: &SessionMessageRequest,
        ) -> Result<SendReceipt, CourierError> {
            self.reply()
        }
        async fn send_template_message(
            &self,
            _request: &TemplateMessageRequest,
        ) -> Result<SendReceipt, CourierError> {
            self.reply()
        }
    }

    async fn service(
        sender: StubSender,
    ) -> (OutboundService, Arc<SqliteStorage>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let storage = Arc::new(SqliteStorage::new(StorageConfig {
            database_path: dir.path().join("outbound.db").to_string_lossy().to_string(),
            wal_mode: true,
            call_timeout_secs: 5,
        }));
        storage.initialize().await.unwrap();
        let store: Arc<dyn StorageAdapter> = storage.clone();
        let service = OutboundService::new(
            Arc::new(sender),
            store,
            Duration::from_secs(5),
            Duration::from_secs(5),
        );
        (service, storage, dir)
    }

    fn session_request() -> SessionMessageRequest {
        SessionMessageRequest {
            wa_id: "27820000000".to_string(),
            text: "your order shipped".to_string(),
        }
    }

    #[tokio::test]
    async fn accepted_session_send_is_recorded_under_provider_id() {
        let (service, storage, _dir) = service(StubSender {
            message_id: Some("wamid.out1".to_string()),
            fail: false,
        })
        .await;
        let id = service.send_session(&session_request()).await.unwrap();
        assert_eq!(id, "wamid.out1");

        let record = storage.get_message("wamid.out1").await.unwrap().unwrap();
        assert_eq!(record.kind, MessageKind::Session);
        assert_eq!(record.direction, Direction::Outgoing);
        assert_eq!(record.status, MessageStatus::Sent);
        assert_eq!(record.text.as_deref(), Some("your order shipped"));
    }

    #[tokio::test]
    async fn missing_provider_id_falls_back_to_generated_id() {
        let (service, storage, _dir) = service(StubSender {
            message_id: None,
            fail: false,
        })
        .await;
        let request = TemplateMessageRequest {
            wa_id: "27820000000".to_string(),
            template_name: "order_update".to_string(),
            broadcast_name: "orders".to_string(),
            parameters: vec![TemplateParameter {
                name: "order".to_string(),
                value: "42".to_string(),
            }],
        };
        let id = service.send_template(&request).await.unwrap();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        let record = storage.get_message(&id).await.unwrap().unwrap();
        assert_eq!(record.kind, MessageKind::Template);
    }

    #[tokio::test]
    async fn failed_send_records_nothing() {
        let (service, storage, _dir) = service(StubSender {
            message_id: Some("wamid.never".to_string()),
            fail: true,
        })
        .await;
        let err = service.send_session(&session_request()).await.unwrap_err();
        assert!(matches!(err, CourierError::OutboundSendFailed { status: Some(400), .. }));
        let history = storage
            .query_by_counterparty("27820000000", courier_core::types::SortOrder::Desc, 10)
            .await
            .unwrap();
        assert!(history.is_empty());
    }
}
