// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management.
//!
//! All access goes through a single `tokio_rusqlite::Connection`, whose
//! background thread serializes writes. PRAGMAs are applied and migrations
//! run before the handle is returned.

use courier_core::CourierError;
use tracing::{debug, info};

/// Name of the composite index backing the counterparty history read path.
pub const COUNTERPARTY_INDEX: &str = "idx_messages_counterparty_timestamp";

/// A migrated SQLite database handle.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` in WAL mode.
    pub async fn open(path: &str) -> Result<Self, CourierError> {
        Self::open_with(path, true).await
    }

    /// Open the database, choosing the journal mode.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, CourierError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(CourierError::storage)?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(CourierError::storage)?;
        let db = Self { conn };
        db.prepare(wal_mode).await?;
        info!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// Open a private in-memory database. Used by tests and dry runs.
    pub async fn open_in_memory() -> Result<Self, CourierError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(CourierError::storage)?;
        let db = Self { conn };
        db.prepare(false).await?;
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), CourierError> {
        self.conn
            .call(move |conn| -> Result<(), CourierError> {
                if wal_mode {
                    conn.pragma_update(None, "journal_mode", "WAL")
                        .map_err(CourierError::storage)?;
                }
                conn.execute_batch(
                    "PRAGMA synchronous = NORMAL;
                     PRAGMA busy_timeout = 5000;
                     PRAGMA foreign_keys = ON;",
                )
                .map_err(CourierError::storage)?;
                crate::migrations::run_migrations(conn)
            })
            .await
            .map_err(|e| match e {
                tokio_rusqlite::Error::Error(inner) => inner,
                other => CourierError::storage(other.to_string()),
            })?;
        debug!("pragmas applied and migrations complete");
        Ok(())
    }

    /// Returns the underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL so the main database file is self-contained.
    pub async fn checkpoint(&self) -> Result<(), CourierError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint and close the connection.
    pub async fn close(self) -> Result<(), CourierError> {
        self.checkpoint().await?;
        self.conn.close().await.map_err(CourierError::storage)?;
        debug!("database closed");
        Ok(())
    }
}

/// Map a tokio-rusqlite call failure into a storage error.
///
/// A statement naming an index SQLite does not have becomes
/// [`CourierError::IndexUnavailable`] so read paths can degrade.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> CourierError {
    if let tokio_rusqlite::Error::Error(rusqlite::Error::SqliteFailure(_, Some(msg))) = &e
        && let Some(index) = msg.strip_prefix("no such index: ")
    {
        return CourierError::IndexUnavailable {
            index: index.trim().to_string(),
        };
    }
    CourierError::storage(e)
}
