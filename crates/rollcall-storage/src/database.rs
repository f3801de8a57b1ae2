// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. Do NOT open additional connections for writes.

use std::path::Path;

use rollcall_core::RollcallError;
use tracing::{debug, info};

use crate::migrations;

/// Convert a tokio-rusqlite error into a persistence failure.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> RollcallError {
    RollcallError::storage(e)
}

/// Handle to the Rollcall SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if needed) the database at `path`, applies PRAGMAs
    /// and runs pending migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, RollcallError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(RollcallError::storage)?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(RollcallError::storage)?;
        let db = Self { conn };
        db.prepare(wal_mode).await?;
        info!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// Opens a private in-memory database. Used by tests and `rollcall check`.
    pub async fn open_in_memory() -> Result<Self, RollcallError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(RollcallError::storage)?;
        let db = Self { conn };
        db.prepare(false).await?;
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), RollcallError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                if wal_mode {
                    // journal_mode returns a row, so it cannot go through execute_batch.
                    let mode: String =
                        conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
                    debug!(journal_mode = %mode, "journal mode set");
                    conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
                }
                conn.execute_batch(
                    "PRAGMA foreign_keys = ON;
                     PRAGMA busy_timeout = 5000;",
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        self.conn
            .call(|conn| -> Result<(), RollcallError> { migrations::run_migrations(conn) })
            .await
            .map_err(|e| match e {
                tokio_rusqlite::Error::Error(inner) => inner,
                other => RollcallError::Storage {
                    source: other.to_string().into(),
                },
            })
    }

    /// The underlying connection, for query modules.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoints the WAL and closes the connection.
    pub async fn close(self) -> Result<(), RollcallError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)?;
        debug!("database closed");
        Ok(())
    }
}
