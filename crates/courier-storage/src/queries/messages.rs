// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message record operations.

use courier_core::types::{MessagePatch, MessageRecord, SortOrder};
use courier_core::CourierError;
use rusqlite::{OptionalExtension, params};

use crate::database::{COUNTERPARTY_INDEX, Database, map_tr_err};
use crate::queries::{json_column, parse_column};

const SELECT_COLUMNS: &str = "id, counterparty_id, text, kind, media_info, status, direction,
     timestamp, delivered_at, read_at, raw_event";

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRecord> {
    let media_info: Option<String> = row.get(4)?;
    let media_info = match media_info {
        Some(raw) => Some(serde_json::from_str(&raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?),
        None => None,
    };
    Ok(MessageRecord {
        id: Some(row.get(0)?),
        counterparty_id: row.get(1)?,
        text: row.get(2)?,
        kind: parse_column(row, 3)?,
        media_info,
        status: parse_column(row, 5)?,
        direction: parse_column(row, 6)?,
        timestamp: row.get(7)?,
        delivered_at: row.get(8)?,
        read_at: row.get(9)?,
        raw_event: json_column(row, 10)?,
    })
}

/// Write `record` at `id`, replacing every field of any existing record.
pub async fn upsert_message(
    db: &Database,
    id: &str,
    record: &MessageRecord,
) -> Result<(), CourierError> {
    let id = id.to_string();
    let record = record.clone();
    let media_info = record
        .media_info
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(CourierError::storage)?;
    let raw_event = serde_json::to_string(&record.raw_event).map_err(CourierError::storage)?;

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, counterparty_id, text, kind, media_info, status,
                     direction, timestamp, delivered_at, read_at, raw_event)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(id) DO UPDATE SET
                     counterparty_id = excluded.counterparty_id,
                     text = excluded.text,
                     kind = excluded.kind,
                     media_info = excluded.media_info,
                     status = excluded.status,
                     direction = excluded.direction,
                     timestamp = excluded.timestamp,
                     delivered_at = excluded.delivered_at,
                     read_at = excluded.read_at,
                     raw_event = excluded.raw_event,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![
                    id,
                    record.counterparty_id,
                    record.text,
                    record.kind.to_string(),
                    media_info,
                    record.status.to_string(),
                    record.direction.to_string(),
                    record.timestamp,
                    record.delivered_at,
                    record.read_at,
                    raw_event,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Merge the present fields of `patch` onto the record at `id`.
///
/// Returns the number of rows touched (0 when no record exists).
pub async fn patch_message(
    db: &Database,
    id: &str,
    patch: &MessagePatch,
) -> Result<usize, CourierError> {
    let id = id.to_string();
    let status = patch.status.map(|s| s.to_string());
    let delivered_at = patch.delivered_at;
    let read_at = patch.read_at;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE messages SET
                     status = COALESCE(?2, status),
                     delivered_at = COALESCE(?3, delivered_at),
                     read_at = COALESCE(?4, read_at),
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id, status, delivered_at, read_at],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch one record by id.
pub async fn get_message(db: &Database, id: &str) -> Result<Option<MessageRecord>, CourierError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM messages WHERE id = ?1"),
                params![id],
                row_to_record,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Indexed history read: filter, order, and limit in one statement.
///
/// Names the composite index explicitly, so it fails with
/// [`CourierError::IndexUnavailable`] rather than silently scanning when
/// the index is absent.
pub async fn query_indexed(
    db: &Database,
    counterparty_id: &str,
    order: SortOrder,
    limit: usize,
) -> Result<Vec<MessageRecord>, CourierError> {
    let counterparty_id = counterparty_id.to_string();
    let direction = match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM messages INDEXED BY {COUNTERPARTY_INDEX}
         WHERE counterparty_id = ?1
         ORDER BY timestamp {direction}, id {direction}
         LIMIT ?2"
    );
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![counterparty_id, limit], row_to_record)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Filter-only history read. Returns every record for the counterparty, unordered.
pub async fn query_unordered(
    db: &Database,
    counterparty_id: &str,
) -> Result<Vec<MessageRecord>, CourierError> {
    let counterparty_id = counterparty_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM messages WHERE counterparty_id = ?1"
            ))?;
            let rows = stmt.query_map(params![counterparty_id], row_to_record)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
