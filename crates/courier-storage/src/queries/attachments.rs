// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attachment entity operations.

use courier_core::types::Attachment;
use courier_core::CourierError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Create or replace the attachment owned by `attachment.message_id`.
pub async fn insert_attachment(db: &Database, attachment: &Attachment) -> Result<(), CourierError> {
    let a = attachment.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO attachments
                     (message_id, attachment_id, caption, source_url, mime_kind, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(message_id) DO UPDATE SET
                     attachment_id = excluded.attachment_id,
                     caption = excluded.caption,
                     source_url = excluded.source_url,
                     mime_kind = excluded.mime_kind,
                     timestamp = excluded.timestamp",
                params![
                    a.message_id,
                    a.attachment_id,
                    a.caption,
                    a.source_url,
                    a.mime_kind,
                    a.timestamp,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch the attachment owned by a message.
pub async fn attachment_for_message(
    db: &Database,
    message_id: &str,
) -> Result<Option<Attachment>, CourierError> {
    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT attachment_id, message_id, caption, source_url, mime_kind, timestamp
                 FROM attachments WHERE message_id = ?1",
                params![message_id],
                |row| {
                    Ok(Attachment {
                        attachment_id: row.get(0)?,
                        message_id: row.get(1)?,
                        caption: row.get(2)?,
                        source_url: row.get(3)?,
                        mime_kind: row.get(4)?,
                        timestamp: row.get(5)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
