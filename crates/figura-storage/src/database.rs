// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use figura_core::FiguraError;
use tracing::debug;

use crate::migrations;

/// Handle to the registry database.
///
/// Wraps a single `tokio_rusqlite::Connection`; every query module goes
/// through [`Database::connection`], so writes are serialized on one thread.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path`, run pending
    /// migrations, and apply connection PRAGMAs.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, FiguraError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(FiguraError::storage)?;
        }

        // Migrations run on a short-lived blocking connection before the
        // single writer is opened.
        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), FiguraError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(FiguraError::storage)?;
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| FiguraError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| FiguraError::Storage {
                source: Box::new(e),
            })?;

        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            conn.busy_timeout(std::time::Duration::from_secs(5))?;
            if wal_mode {
                conn.query_row("PRAGMA journal_mode = WAL;", [], |_| Ok(()))?;
            }
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The single writer connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }
}

/// Convert a tokio-rusqlite error into FiguraError::Storage.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> FiguraError {
    FiguraError::Storage {
        source: Box::new(e),
    }
}

/// Current UTC time in the fixed-width ISO 8601 form used for every stored timestamp.
///
/// Fixed width keeps lexicographic and chronological order identical.
pub fn now_timestamp() -> String {
    format_timestamp(chrono::Utc::now())
}

/// Format a UTC instant as a stored timestamp.
pub fn format_timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
