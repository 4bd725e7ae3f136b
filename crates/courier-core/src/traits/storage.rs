// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage traits for the reconciliation store and the webhook ledger.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Attachment, LedgerEntry, MessagePatch, MessageRecord, ProcessingResult, SortOrder,
};

/// Idempotent message persistence keyed by message id.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Creates or fully replaces the record at its id.
    ///
    /// When `record.id` is `None` the store assigns one. Returns the id written.
    async fn upsert_message(&self, record: &MessageRecord) -> Result<String, CourierError>;

    /// Merges `patch` onto an existing record.
    ///
    /// Fails with [`CourierError::NotFound`] when no record exists at `id`.
    async fn patch_message(&self, id: &str, patch: &MessagePatch) -> Result<(), CourierError>;

    /// Fetches a single record by id.
    async fn get_message(&self, id: &str) -> Result<Option<MessageRecord>, CourierError>;

    /// Returns up to `limit` records for a counterparty, ascending by timestamp.
    ///
    /// `order` picks which end of the history is kept when truncating. A
    /// missing composite index is recovered internally and never surfaces.
    async fn query_by_counterparty(
        &self,
        counterparty_id: &str,
        order: SortOrder,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, CourierError>;

    /// Creates or replaces the attachment entity owned by `attachment.message_id`.
    async fn insert_attachment(&self, attachment: &Attachment) -> Result<(), CourierError>;

    /// Fetches the attachment entity owned by a message.
    async fn attachment_for_message(
        &self,
        message_id: &str,
    ) -> Result<Option<Attachment>, CourierError>;
}

/// Append-then-annotate audit trail of raw inbound events.
#[async_trait]
pub trait WebhookLedger: Send + Sync {
    /// Records a raw event as unprocessed and returns its ledger id.
    async fn append(&self, raw_event: &serde_json::Value) -> Result<String, CourierError>;

    /// Marks an entry processed with its outcome.
    ///
    /// An entry is annotated at most once; annotating a processed entry fails.
    async fn annotate(&self, ledger_id: &str, result: &ProcessingResult)
        -> Result<(), CourierError>;

    /// Fetches a ledger entry by id.
    async fn get_entry(&self, ledger_id: &str) -> Result<Option<LedgerEntry>, CourierError>;

    /// Lists entries still awaiting annotation, oldest first.
    async fn list_unprocessed(&self, limit: usize) -> Result<Vec<LedgerEntry>, CourierError>;
}

/// A storage backend providing both the message store and the ledger.
#[async_trait]
pub trait StorageAdapter: PluginAdapter + MessageStore + WebhookLedger {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), CourierError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), CourierError>;
}
