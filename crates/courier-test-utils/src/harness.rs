// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the ingestion stack over a temp SQLite database:
//! real storage behind a [`FaultyStore`], a [`MockSender`], the webhook
//! pipeline, and the outbound service.

use std::sync::Arc;
use std::time::Duration;

use courier_config::model::{CourierConfig, StorageConfig};
use courier_core::{CourierError, OutboundSender, StorageAdapter};
use courier_storage::SqliteStorage;
use courier_webhook::{OutboundService, WebhookPipeline};

use crate::faulty_store::FaultyStore;
use crate::mock_sender::MockSender;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    store_timeout: Duration,
    send_timeout: Duration,
    sender: Option<MockSender>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            store_timeout: Duration::from_secs(5),
            send_timeout: Duration::from_secs(5),
            sender: None,
        }
    }

    /// Bound on each store call made by the pipeline and outbound service.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Bound on each outbound send.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Use a pre-scripted mock sender.
    pub fn with_sender(mut self, sender: MockSender) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, CourierError> {
        let temp_dir = tempfile::TempDir::new().map_err(CourierError::storage)?;
        let db_path = temp_dir.path().join("test.db");

        let storage_config = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
            call_timeout_secs: self.store_timeout.as_secs().max(1),
        };
        let storage = Arc::new(SqliteStorage::new(storage_config.clone()));
        storage.initialize().await?;

        let inner: Arc<dyn StorageAdapter> = storage.clone();
        let faults = Arc::new(FaultyStore::new(inner));
        let store: Arc<dyn StorageAdapter> = faults.clone();

        let sender = Arc::new(self.sender.unwrap_or_default());
        let outbound_sender: Arc<dyn OutboundSender> = sender.clone();

        let pipeline = Arc::new(WebhookPipeline::new(store.clone(), self.store_timeout));
        let outbound = Arc::new(OutboundService::new(
            outbound_sender,
            store.clone(),
            self.send_timeout,
            self.store_timeout,
        ));

        let mut config = CourierConfig::default();
        config.storage = storage_config;
        config.provider.base_url = Some("http://provider.invalid".to_string());
        config.provider.api_token = Some("test-token".to_string());

        Ok(TestHarness {
            storage,
            faults,
            store,
            sender,
            pipeline,
            outbound,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock sender and temp storage.
pub struct TestHarness {
    /// SQLite storage (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// Fault injection in front of `storage`.
    pub faults: Arc<FaultyStore>,
    /// The store handed to the pipeline and outbound service (the faulty wrapper).
    pub store: Arc<dyn StorageAdapter>,
    /// The mock outbound sender.
    pub sender: Arc<MockSender>,
    pub pipeline: Arc<WebhookPipeline>,
    pub outbound: Arc<OutboundService>,
    /// Configuration matching the harness wiring.
    pub config: CourierConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Build a harness with default settings.
    pub async fn new() -> Result<Self, CourierError> {
        Self::builder().build().await
    }

    /// Drop the composite history index, forcing the degraded read path.
    pub async fn drop_history_index(&self) -> Result<(), CourierError> {
        self.storage
            .database()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch(&format!(
                    "DROP INDEX IF EXISTS {}",
                    courier_storage::COUNTERPARTY_INDEX
                ))
            })
            .await
            .map_err(CourierError::storage)
    }
}
