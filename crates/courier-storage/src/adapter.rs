// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use courier_config::model::StorageConfig;
use courier_core::types::{
    Attachment, LedgerEntry, MessagePatch, MessageRecord, ProcessingResult, SortOrder,
};
use courier_core::{
    AdapterType, CourierError, HealthStatus, MessageStore, PluginAdapter, StorageAdapter,
    WebhookLedger,
};

use crate::database::Database;
use crate::queries;
use crate::queries::ledger::AnnotateStatus;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`] is called.
    ///
    /// [`initialize`]: StorageAdapter::initialize
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns the underlying Database, or an error if not initialized.
    pub fn database(&self) -> Result<&Database, CourierError> {
        self.db.get().ok_or_else(|| CourierError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

/// Stable ascending order: timestamp, then id.
fn sort_ascending(records: &mut [MessageRecord]) {
    records.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Order and truncate in memory the way the indexed statement would.
fn order_and_limit(
    mut records: Vec<MessageRecord>,
    order: SortOrder,
    limit: usize,
) -> Vec<MessageRecord> {
    sort_ascending(&mut records);
    match order {
        SortOrder::Asc => records.truncate(limit),
        SortOrder::Desc => {
            let skip = records.len().saturating_sub(limit);
            records.drain(..skip);
        }
    }
    records
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    /// Unhealthy when the database is not open or does not answer. Degraded
    /// when the counterparty history index is gone and history reads fall
    /// back to a filter-only scan.
    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("storage not initialized".to_string()));
        };
        let index_count = db
            .connection()
            .call(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?1",
                    [crate::COUNTERPARTY_INDEX],
                    |row| row.get::<_, i64>(0),
                )
            })
            .await
            .map_err(crate::database::map_tr_err);
        match index_count {
            Ok(0) => Ok(HealthStatus::Degraded(format!(
                "index {} is missing",
                crate::COUNTERPARTY_INDEX
            ))),
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => {
                warn!(error = %e, "storage health check failed");
                Ok(HealthStatus::Unhealthy(e.to_string()))
            }
        }
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl MessageStore for SqliteStorage {
    async fn upsert_message(&self, record: &MessageRecord) -> Result<String, CourierError> {
        let id = record
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        queries::messages::upsert_message(self.database()?, &id, record).await?;
        Ok(id)
    }

    async fn patch_message(&self, id: &str, patch: &MessagePatch) -> Result<(), CourierError> {
        let touched = queries::messages::patch_message(self.database()?, id, patch).await?;
        if touched == 0 {
            return Err(CourierError::NotFound {
                collection: "messages".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn get_message(&self, id: &str) -> Result<Option<MessageRecord>, CourierError> {
        queries::messages::get_message(self.database()?, id).await
    }

    async fn query_by_counterparty(
        &self,
        counterparty_id: &str,
        order: SortOrder,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, CourierError> {
        let db = self.database()?;
        let mut records =
            match queries::messages::query_indexed(db, counterparty_id, order, limit).await {
                Ok(records) => records,
                Err(CourierError::IndexUnavailable { index }) => {
                    warn!(
                        counterparty_id,
                        index = %index,
                        "composite index unavailable, serving filter-only query"
                    );
                    courier_prometheus::record_degraded_query();
                    let unordered = queries::messages::query_unordered(db, counterparty_id).await?;
                    order_and_limit(unordered, order, limit)
                }
                Err(e) => return Err(e),
            };
        sort_ascending(&mut records);
        Ok(records)
    }

    async fn insert_attachment(&self, attachment: &Attachment) -> Result<(), CourierError> {
        queries::attachments::insert_attachment(self.database()?, attachment).await
    }

    async fn attachment_for_message(
        &self,
        message_id: &str,
    ) -> Result<Option<Attachment>, CourierError> {
        queries::attachments::attachment_for_message(self.database()?, message_id).await
    }
}

#[async_trait]
impl WebhookLedger for SqliteStorage {
    async fn append(&self, raw_event: &serde_json::Value) -> Result<String, CourierError> {
        queries::ledger::append(self.database()?, raw_event).await
    }

    async fn annotate(
        &self,
        ledger_id: &str,
        result: &ProcessingResult,
    ) -> Result<(), CourierError> {
        match queries::ledger::annotate(self.database()?, ledger_id, result).await? {
            AnnotateStatus::Annotated => Ok(()),
            AnnotateStatus::AlreadyProcessed => Err(CourierError::Internal(format!(
                "ledger entry {ledger_id} is already processed"
            ))),
            AnnotateStatus::Missing => Err(CourierError::NotFound {
                collection: "webhook_ledger".to_string(),
                id: ledger_id.to_string(),
            }),
        }
    }

    async fn get_entry(&self, ledger_id: &str) -> Result<Option<LedgerEntry>, CourierError> {
        queries::ledger::get_entry(self.database()?, ledger_id).await
    }

    async fn list_unprocessed(&self, limit: usize) -> Result<Vec<LedgerEntry>, CourierError> {
        queries::ledger::list_unprocessed(self.database()?, limit).await
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), CourierError> {
        let path = self.config.database_path.clone();
        let db = Database::open_with(&path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| CourierError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), CourierError> {
        self.database()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}
