// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The ingestion pipeline.
//!
//! One call to [`WebhookPipeline::ingest`] handles one inbound event:
//! append to the ledger, classify, project, persist, annotate. Every store
//! call is bounded by the configured timeout. A store failure or timeout
//! aborts the call and leaves the ledger entry unprocessed.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use courier_core::types::{EventKind, ProcessingOutcome, ProcessingResult};
use courier_core::{CourierError, StorageAdapter};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::classifier::classify;
use crate::projector::{Projection, project};
use crate::timestamp::now_millis;

/// Await `fut`, failing with [`CourierError::Timeout`] after `limit`.
pub async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, CourierError>
where
    F: Future<Output = Result<T, CourierError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(CourierError::Timeout { duration: limit }),
    }
}

/// What happened to one ingested event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub ledger_id: String,
    pub kind: EventKind,
    pub result: ProcessingResult,
}

pub struct WebhookPipeline {
    store: Arc<dyn StorageAdapter>,
    timeout: Duration,
}

impl WebhookPipeline {
    pub fn new(store: Arc<dyn StorageAdapter>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn store(&self) -> &Arc<dyn StorageAdapter> {
        &self.store
    }

    /// Ingest one raw event.
    ///
    /// Returns an error only for store failures and timeouts. Malformed
    /// events, unknown event types, and missing update targets are
    /// acknowledged and recorded in the report.
    pub async fn ingest(&self, raw: Value) -> Result<IngestReport, CourierError> {
        let started = Instant::now();
        let ledger_id = bounded(self.timeout, self.store.append(&raw)).await?;

        let kind = classify(&raw);
        courier_prometheus::record_event(&kind.to_string());
        debug!(ledger_id = %ledger_id, event_kind = %kind, "event classified");

        let result = self.process(kind, &raw).await?;
        if result.outcome.is_anomaly() {
            warn!(
                ledger_id = %ledger_id,
                event_kind = %kind,
                outcome = %result.outcome,
                detail = result.detail.as_deref().unwrap_or(""),
                "webhook anomaly"
            );
            courier_prometheus::record_anomaly(&result.outcome.to_string());
        }

        bounded(self.timeout, self.store.annotate(&ledger_id, &result)).await?;
        courier_prometheus::record_ingest_latency(started.elapsed().as_secs_f64());
        info!(
            ledger_id = %ledger_id,
            event_kind = %kind,
            outcome = %result.outcome,
            message_id = result.message_id.as_deref().unwrap_or(""),
            "webhook processed"
        );

        Ok(IngestReport {
            ledger_id,
            kind,
            result,
        })
    }

    async fn process(
        &self,
        kind: EventKind,
        raw: &Value,
    ) -> Result<ProcessingResult, CourierError> {
        let projection = match project(kind, raw, now_millis()) {
            Ok(projection) => projection,
            Err(CourierError::MalformedEvent { reason, .. }) => {
                return Ok(outcome(kind, ProcessingOutcome::MalformedEvent, None, Some(reason)));
            }
            Err(e) => return Err(e),
        };

        match projection {
            Projection::Skip => Ok(outcome(kind, ProcessingOutcome::Unhandled, None, None)),
            Projection::Create { record, attachment } => {
                let id = bounded(self.timeout, self.store.upsert_message(&record)).await?;
                let Some(attachment) = attachment else {
                    return Ok(outcome(kind, ProcessingOutcome::Stored, Some(id), None));
                };
                match bounded(self.timeout, self.store.insert_attachment(&attachment)).await {
                    Ok(()) => Ok(outcome(kind, ProcessingOutcome::Stored, Some(id), None)),
                    Err(e) => {
                        warn!(
                            message_id = %id,
                            attachment_id = %attachment.attachment_id,
                            error = %e,
                            "attachment insert failed, message kept"
                        );
                        Ok(outcome(
                            kind,
                            ProcessingOutcome::MediaInsertFailed,
                            Some(id),
                            Some(e.to_string()),
                        ))
                    }
                }
            }
            Projection::Update { id, patch } => {
                match bounded(self.timeout, self.store.patch_message(&id, &patch)).await {
                    Ok(()) => Ok(outcome(kind, ProcessingOutcome::Updated, Some(id), None)),
                    Err(CourierError::NotFound { .. }) => Ok(outcome(
                        kind,
                        ProcessingOutcome::UpdateTargetMissing,
                        Some(id.clone()),
                        Some(format!("no message record with id {id}")),
                    )),
                    Err(e) => Err(e),
                }
            }
        }
    }
}

fn outcome(
    kind: EventKind,
    outcome: ProcessingOutcome,
    message_id: Option<String>,
    detail: Option<String>,
) -> ProcessingResult {
    ProcessingResult {
        kind,
        outcome,
        message_id,
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_config::model::StorageConfig;
    use courier_core::types::{Direction, MessageStatus, SortOrder};
    use courier_core::{MessageStore, WebhookLedger};
    use courier_storage::SqliteStorage;
    use serde_json::json;
    use tempfile::tempdir;

    async fn pipeline() -> (WebhookPipeline, Arc<SqliteStorage>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("pipeline.db").to_string_lossy().to_string(),
            wal_mode: true,
            call_timeout_secs: 5,
        };
        let storage = Arc::new(SqliteStorage::new(config));
        storage.initialize().await.unwrap();
        let store: Arc<dyn StorageAdapter> = storage.clone();
        (WebhookPipeline::new(store, Duration::from_secs(5)), storage, dir)
    }

    fn incoming(id: &str) -> Value {
        json!({
            "eventType": "message",
            "id": id,
            "waId": "27820000000",
            "text": "hi",
            "timestamp": "1700000000"
        })
    }

    #[tokio::test]
    async fn incoming_message_is_stored_and_ledgered() {
        let (pipeline, storage, _dir) = pipeline().await;
        let report = pipeline.ingest(incoming("m1")).await.unwrap();
        assert_eq!(report.kind, EventKind::IncomingMessage);
        assert_eq!(report.result.outcome, ProcessingOutcome::Stored);
        assert_eq!(report.result.message_id.as_deref(), Some("m1"));

        let history = storage
            .query_by_counterparty("27820000000", SortOrder::Desc, 10)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        let record = &history[0];
        assert_eq!(record.id.as_deref(), Some("m1"));
        assert_eq!(record.text.as_deref(), Some("hi"));
        assert_eq!(record.status, MessageStatus::Received);
        assert_eq!(record.direction, Direction::Incoming);
        assert_eq!(record.timestamp, 1_700_000_000_000);

        let entry = storage.get_entry(&report.ledger_id).await.unwrap().unwrap();
        assert!(entry.processed);
        assert_eq!(entry.processing_result, Some(report.result));
    }

    #[tokio::test]
    async fn duplicate_delivery_stores_one_record_and_two_ledger_entries() {
        let (pipeline, storage, _dir) = pipeline().await;
        let first = pipeline.ingest(incoming("m1")).await.unwrap();
        let second = pipeline.ingest(incoming("m1")).await.unwrap();
        assert_ne!(first.ledger_id, second.ledger_id);

        let history = storage
            .query_by_counterparty("27820000000", SortOrder::Asc, 10)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn delivered_updates_existing_record_only() {
        let (pipeline, storage, _dir) = pipeline().await;
        pipeline.ingest(incoming("m1")).await.unwrap();

        let report = pipeline
            .ingest(json!({
                "eventType": "sentMessageDELIVERED_v2",
                "id": "m1",
                "timestamp": "1700000500"
            }))
            .await
            .unwrap();
        assert_eq!(report.result.outcome, ProcessingOutcome::Updated);

        let record = storage.get_message("m1").await.unwrap().unwrap();
        assert_eq!(record.status, MessageStatus::Delivered);
        assert_eq!(record.delivered_at, Some(1_700_000_500_000));
        assert_eq!(record.text.as_deref(), Some("hi"));
        assert_eq!(record.timestamp, 1_700_000_000_000);
        assert_eq!(record.read_at, None);
    }

    #[tokio::test]
    async fn delivered_for_unknown_id_is_an_anomaly_without_placeholder() {
        let (pipeline, storage, _dir) = pipeline().await;
        let report = pipeline
            .ingest(json!({
                "eventType": "sentMessageDELIVERED",
                "id": "ghost",
                "timestamp": "1700000500"
            }))
            .await
            .unwrap();
        assert_eq!(report.result.outcome, ProcessingOutcome::UpdateTargetMissing);
        assert!(report.result.outcome.is_anomaly());
        assert!(report.result.detail.is_some());
        assert!(storage.get_message("ghost").await.unwrap().is_none());

        let entry = storage.get_entry(&report.ledger_id).await.unwrap().unwrap();
        assert!(entry.processed);
    }

    #[tokio::test]
    async fn media_event_stores_message_and_attachment() {
        let (pipeline, storage, _dir) = pipeline().await;
        let report = pipeline
            .ingest(json!({
                "eventType": "message",
                "id": "m2",
                "waId": "27820000000",
                "type": "image",
                "data": "https://host/file?fileName=cat.jpg"
            }))
            .await
            .unwrap();
        assert_eq!(report.kind, EventKind::IncomingMedia);
        assert_eq!(report.result.outcome, ProcessingOutcome::Stored);

        let record = storage.get_message("m2").await.unwrap().unwrap();
        assert_eq!(record.media_info.unwrap().attachment_id, "cat.jpg");
        let attachment = storage.attachment_for_message("m2").await.unwrap().unwrap();
        assert_eq!(attachment.attachment_id, "cat.jpg");
        assert_eq!(attachment.message_id, "m2");
    }

    #[tokio::test]
    async fn unhandled_event_is_acknowledged_and_ledgered() {
        let (pipeline, storage, _dir) = pipeline().await;
        let report = pipeline
            .ingest(json!({"eventType": "newContactMessageReceived", "waId": "1"}))
            .await
            .unwrap();
        assert_eq!(report.kind, EventKind::Unhandled);
        assert_eq!(report.result.outcome, ProcessingOutcome::Unhandled);
        assert!(!report.result.outcome.is_anomaly());

        let entry = storage.get_entry(&report.ledger_id).await.unwrap().unwrap();
        assert!(entry.processed);
    }

    #[tokio::test]
    async fn malformed_event_is_acknowledged_with_detail() {
        let (pipeline, storage, _dir) = pipeline().await;
        let report = pipeline
            .ingest(json!({"eventType": "message", "text": "no id"}))
            .await
            .unwrap();
        assert_eq!(report.result.outcome, ProcessingOutcome::MalformedEvent);
        assert!(report.result.detail.unwrap().contains("id"));
        assert!(storage.list_unprocessed(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn session_sent_without_id_gets_assigned_one() {
        let (pipeline, storage, _dir) = pipeline().await;
        let report = pipeline
            .ingest(json!({
                "eventType": "sessionMessageSent_v2",
                "waId": "27820000000",
                "text": "hello from us",
                "timestamp": "1700000100"
            }))
            .await
            .unwrap();
        let id = report.result.message_id.unwrap();
        let record = storage.get_message(&id).await.unwrap().unwrap();
        assert_eq!(record.direction, Direction::Outgoing);
        assert_eq!(record.status, MessageStatus::Sent);
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, CourierError>(())
        };
        let err = bounded(Duration::from_secs(1), slow).await.unwrap_err();
        assert!(matches!(
            err,
            CourierError::Timeout { duration } if duration == Duration::from_secs(1)
        ));
    }

    #[tokio::test]
    async fn bounded_passes_results_through() {
        let ok = bounded(Duration::from_secs(1), async { Ok::<_, CourierError>(7) }).await;
        assert_eq!(ok.unwrap(), 7);
        let err = bounded(Duration::from_secs(1), async {
            Err::<(), _>(CourierError::Internal("boom".to_string()))
        })
        .await;
        assert!(matches!(err, Err(CourierError::Internal(_))));
    }
}
