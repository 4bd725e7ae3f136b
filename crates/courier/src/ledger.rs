// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier ledger` command: inspect ledgered webhook events.

use courier_config::CourierConfig;
use courier_core::types::LedgerEntry;
use courier_core::{CourierError, StorageAdapter, WebhookLedger};
use courier_storage::SqliteStorage;

/// Runs the `courier ledger` command.
pub async fn run_ledger(
    config: &CourierConfig,
    id: Option<&str>,
    unprocessed: bool,
    limit: usize,
) -> Result<(), CourierError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;

    let result = match (id, unprocessed) {
        (Some(id), _) => match storage.get_entry(id).await? {
            Some(entry) => print_entry(&entry),
            None => Err(CourierError::NotFound {
                collection: "webhook_ledger".to_string(),
                id: id.to_string(),
            }),
        },
        (None, true) => {
            let entries = storage.list_unprocessed(limit).await?;
            if entries.is_empty() {
                eprintln!("no unprocessed ledger entries");
            }
            entries.iter().try_for_each(print_entry)
        }
        (None, false) => Err(CourierError::Config(
            "pass a ledger entry id or --unprocessed".to_string(),
        )),
    };

    storage.close().await?;
    result
}

fn print_entry(entry: &LedgerEntry) -> Result<(), CourierError> {
    let line = serde_json::to_string(&summary(entry))
        .map_err(|e| CourierError::Internal(format!("failed to render ledger entry: {e}")))?;
    println!("{line}");
    Ok(())
}

fn summary(entry: &LedgerEntry) -> serde_json::Value {
    let received = chrono::DateTime::from_timestamp_millis(entry.received_at)
        .map(|d| d.to_rfc3339())
        .unwrap_or_default();
    serde_json::json!({
        "id": entry.id,
        "receivedAt": received,
        "processed": entry.processed,
        "eventType": entry.raw_event.get("eventType"),
        "result": entry.processing_result,
        "rawEvent": entry.raw_event,
    })
}
