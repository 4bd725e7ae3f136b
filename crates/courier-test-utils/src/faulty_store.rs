// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fault-injecting storage wrapper.
//!
//! `FaultyStore` delegates to a real [`StorageAdapter`] and can be told to
//! fail or hang individual operations, for exercising the pipeline's
//! StoreUnavailable, Timeout, and degraded-media paths.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use courier_core::types::{
    AdapterType, Attachment, HealthStatus, LedgerEntry, MessagePatch, MessageRecord,
    ProcessingResult, SortOrder,
};
use courier_core::{CourierError, MessageStore, PluginAdapter, StorageAdapter, WebhookLedger};

/// A storage operation that can be faulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Append,
    Annotate,
    Upsert,
    Patch,
    InsertAttachment,
    Query,
}

/// How a faulted operation misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Return a storage error immediately.
    Fail,
    /// Never complete.
    Hang,
}

pub struct FaultyStore {
    inner: Arc<dyn StorageAdapter>,
    faults: Mutex<HashMap<StoreOp, Fault>>,
}

impl FaultyStore {
    pub fn new(inner: Arc<dyn StorageAdapter>) -> Self {
        Self {
            inner,
            faults: Mutex::new(HashMap::new()),
        }
    }

    /// Inject `fault` into every later call of `op`.
    pub fn inject(&self, op: StoreOp, fault: Fault) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.insert(op, fault);
        }
    }

    /// Remove every injected fault.
    pub fn heal(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.clear();
        }
    }

    async fn check(&self, op: StoreOp) -> Result<(), CourierError> {
        let fault = self.faults.lock().ok().and_then(|f| f.get(&op).copied());
        match fault {
            None => Ok(()),
            Some(Fault::Fail) => Err(CourierError::storage(format!("injected failure on {op:?}"))),
            Some(Fault::Hang) => std::future::pending().await,
        }
    }
}

#[async_trait]
impl PluginAdapter for FaultyStore {
    fn name(&self) -> &str {
        "faulty"
    }

    fn version(&self) -> semver::Version {
        self.inner.version()
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl MessageStore for FaultyStore {
    async fn upsert_message(&self, record: &MessageRecord) -> Result<String, CourierError> {
        self.check(StoreOp::Upsert).await?;
        self.inner.upsert_message(record).await
    }

    async fn patch_message(&self, id: &str, patch: &MessagePatch) -> Result<(), CourierError> {
        self.check(StoreOp::Patch).await?;
        self.inner.patch_message(id, patch).await
    }

    async fn get_message(&self, id: &str) -> Result<Option<MessageRecord>, CourierError> {
        self.inner.get_message(id).await
    }

    async fn query_by_counterparty(
        &self,
        counterparty_id: &str,
        order: SortOrder,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, CourierError> {
        self.check(StoreOp::Query).await?;
        self.inner
            .query_by_counterparty(counterparty_id, order, limit)
            .await
    }

    async fn insert_attachment(&self, attachment: &Attachment) -> Result<(), CourierError> {
        self.check(StoreOp::InsertAttachment).await?;
        self.inner.insert_attachment(attachment).await
    }

    async fn attachment_for_message(
        &self,
        message_id: &str,
    ) -> Result<Option<Attachment>, CourierError> {
        self.inner.attachment_for_message(message_id).await
    }
}

#[async_trait]
impl WebhookLedger for FaultyStore {
    async fn append(&self, raw_event: &serde_json::Value) -> Result<String, CourierError> {
        self.check(StoreOp::Append).await?;
        self.inner.append(raw_event).await
    }

    async fn annotate(
        &self,
        ledger_id: &str,
        result: &ProcessingResult,
    ) -> Result<(), CourierError> {
        self.check(StoreOp::Annotate).await?;
        self.inner.annotate(ledger_id, result).await
    }

    async fn get_entry(&self, ledger_id: &str) -> Result<Option<LedgerEntry>, CourierError> {
        self.inner.get_entry(ledger_id).await
    }

    async fn list_unprocessed(&self, limit: usize) -> Result<Vec<LedgerEntry>, CourierError> {
        self.inner.list_unprocessed(limit).await
    }
}

#[async_trait]
impl StorageAdapter for FaultyStore {
    async fn initialize(&self) -> Result<(), CourierError> {
        self.inner.initialize().await
    }

    async fn close(&self) -> Result<(), CourierError> {
        self.inner.close().await
    }
}
