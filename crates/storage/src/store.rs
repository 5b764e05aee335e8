// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store handle: connection lifecycle and schema.

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

/// Errors from durable store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle on the embedded database.
///
/// Opened once at daemon startup and held for the process lifetime. The
/// schema is created on first open; re-opening an existing file is a no-op
/// thanks to `IF NOT EXISTS`.
pub struct Store {
    pub(crate) conn: Connection,
}

impl Store {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory database (tests).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        // WAL keeps readers cheap; FULL sync because every row here is a
        // crash-safety promise.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "FULL")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub(crate) fn now(&self) -> String {
        chrono::Utc::now().to_rfc3339()
    }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS inbox (
    message_id    TEXT PRIMARY KEY,
    session_id    TEXT NOT NULL,
    session_type  TEXT NOT NULL,
    content       TEXT NOT NULL,
    session_name  TEXT,
    ui_action     TEXT,
    received_at   TEXT NOT NULL,
    processed     INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_inbox_unprocessed
    ON inbox (processed, received_at);

CREATE TABLE IF NOT EXISTS outbox (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    kind        TEXT NOT NULL,
    payload     TEXT NOT NULL,
    session_id  TEXT,
    retries     INTEGER NOT NULL DEFAULT 0,
    last_error  TEXT,
    sent        INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_outbox_unsent
    ON outbox (sent, id);

CREATE TABLE IF NOT EXISTS sessions (
    session_id         TEXT PRIMARY KEY,
    name               TEXT,
    session_type       TEXT NOT NULL,
    status             TEXT NOT NULL,
    worker_pid         INTEGER,
    worker_state       TEXT,
    project_path       TEXT,
    pending_tool_call  TEXT,
    pending_form       TEXT,
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS session_log (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id  TEXT NOT NULL,
    sender      TEXT NOT NULL,
    content     TEXT NOT NULL,
    message_id  TEXT,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_session_log_session
    ON session_log (session_id, id);
";

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
