// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook ledger operations.
//!
//! Entries are appended unprocessed and annotated exactly once. The
//! annotation is a conditional update on `processed = 0`, so a second
//! annotation of the same entry changes nothing.

use courier_core::types::{LedgerEntry, ProcessingResult};
use courier_core::CourierError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::queries::{json_column, now_millis};

/// Result of an annotation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotateStatus {
    Annotated,
    AlreadyProcessed,
    Missing,
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerEntry> {
    let result: Option<String> = row.get(4)?;
    let processing_result = match result {
        Some(raw) => Some(serde_json::from_str(&raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?),
        None => None,
    };
    Ok(LedgerEntry {
        id: row.get(0)?,
        raw_event: json_column(row, 1)?,
        received_at: row.get(2)?,
        processed: row.get(3)?,
        processing_result,
    })
}

/// Append a raw event and return the generated ledger id.
pub async fn append(db: &Database, raw_event: &serde_json::Value) -> Result<String, CourierError> {
    let id = uuid::Uuid::new_v4().to_string();
    let raw = serde_json::to_string(raw_event).map_err(CourierError::storage)?;
    let received_at = now_millis();
    let entry_id = id.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO webhook_ledger (id, raw_event, received_at, processed)
                 VALUES (?1, ?2, ?3, 0)",
                params![entry_id, raw, received_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
    Ok(id)
}

/// Mark an unprocessed entry processed with `result`.
pub async fn annotate(
    db: &Database,
    ledger_id: &str,
    result: &ProcessingResult,
) -> Result<AnnotateStatus, CourierError> {
    let ledger_id = ledger_id.to_string();
    let result = serde_json::to_string(result).map_err(CourierError::storage)?;
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE webhook_ledger
                 SET processed = 1, processing_result = ?2,
                     processed_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND processed = 0",
                params![ledger_id, result],
            )?;
            if changed > 0 {
                return Ok(AnnotateStatus::Annotated);
            }
            let exists = conn
                .query_row(
                    "SELECT 1 FROM webhook_ledger WHERE id = ?1",
                    params![ledger_id],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(match exists {
                Some(()) => AnnotateStatus::AlreadyProcessed,
                None => AnnotateStatus::Missing,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch one ledger entry.
pub async fn get_entry(
    db: &Database,
    ledger_id: &str,
) -> Result<Option<LedgerEntry>, CourierError> {
    let ledger_id = ledger_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, raw_event, received_at, processed, processing_result
                 FROM webhook_ledger WHERE id = ?1",
                params![ledger_id],
                row_to_entry,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// List unprocessed entries, oldest first.
pub async fn list_unprocessed(
    db: &Database,
    limit: usize,
) -> Result<Vec<LedgerEntry>, CourierError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, raw_event, received_at, processed, processing_result
                 FROM webhook_ledger WHERE processed = 0
                 ORDER BY received_at ASC, rowid ASC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], row_to_entry)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::types::{EventKind, ProcessingOutcome};
    use serde_json::json;

    fn stored(id: &str) -> ProcessingResult {
        ProcessingResult {
            kind: EventKind::IncomingMessage,
            outcome: ProcessingOutcome::Stored,
            message_id: Some(id.to_string()),
            detail: None,
        }
    }

    #[tokio::test]
    async fn append_records_unprocessed_entry() {
        let db = Database::open_in_memory().await.unwrap();
        let raw = json!({"eventType": "message", "id": "wamid.1"});
        let id = append(&db, &raw).await.unwrap();

        let entry = get_entry(&db, &id).await.unwrap().unwrap();
        assert_eq!(entry.raw_event, raw);
        assert!(!entry.processed);
        assert!(entry.processing_result.is_none());
        assert!(entry.received_at > 0);
    }

    #[tokio::test]
    async fn annotate_happens_once() {
        let db = Database::open_in_memory().await.unwrap();
        let id = append(&db, &json!({})).await.unwrap();

        assert_eq!(
            annotate(&db, &id, &stored("wamid.1")).await.unwrap(),
            AnnotateStatus::Annotated
        );
        assert_eq!(
            annotate(&db, &id, &stored("wamid.2")).await.unwrap(),
            AnnotateStatus::AlreadyProcessed
        );

        let entry = get_entry(&db, &id).await.unwrap().unwrap();
        assert!(entry.processed);
        assert_eq!(entry.processing_result, Some(stored("wamid.1")));
    }

    #[tokio::test]
    async fn annotate_unknown_entry_reports_missing() {
        let db = Database::open_in_memory().await.unwrap();
        assert_eq!(
            annotate(&db, "nope", &stored("x")).await.unwrap(),
            AnnotateStatus::Missing
        );
    }

    #[tokio::test]
    async fn list_unprocessed_skips_annotated_entries() {
        let db = Database::open_in_memory().await.unwrap();
        let first = append(&db, &json!({"n": 1})).await.unwrap();
        let second = append(&db, &json!({"n": 2})).await.unwrap();
        let third = append(&db, &json!({"n": 3})).await.unwrap();
        annotate(&db, &second, &stored("x")).await.unwrap();

        let pending = list_unprocessed(&db, 10).await.unwrap();
        let ids: Vec<&str> = pending.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec![first.as_str(), third.as_str()]);

        let capped = list_unprocessed(&db, 1).await.unwrap();
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].id, first);
    }
}
