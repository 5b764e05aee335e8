// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbox: outbound events pending REST delivery, with retry state.

use crate::store::{Store, StoreError};
use milo_core::{OutboxKind, SessionId};
use rusqlite::params;

/// One pending (or settled) outbound delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxEntry {
    pub id: i64,
    pub kind: String,
    pub payload: String,
    pub session_id: Option<SessionId>,
    pub retries: u32,
    pub last_error: Option<String>,
    pub sent: bool,
    pub created_at: String,
}

impl OutboxEntry {
    /// Typed kind, when the stored string is recognized.
    pub fn kind(&self) -> Option<OutboxKind> {
        OutboxKind::parse(&self.kind)
    }
}

impl Store {
    /// Queue an outbound event for REST delivery. Returns the assigned id.
    pub fn enqueue_outbox(
        &self,
        kind: OutboxKind,
        payload: &str,
        session_id: Option<&SessionId>,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO outbox (kind, payload, session_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                kind.as_str(),
                payload,
                session_id.map(|s| s.as_str()),
                self.now(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Unsent entries in id (insertion) order, skipping rows that have
    /// exhausted `max_retries`.
    pub fn get_unsent(&self, limit: usize, max_retries: u32) -> Result<Vec<OutboxEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, payload, session_id, retries, last_error, sent, created_at
             FROM outbox WHERE sent = 0 AND retries < ?1
             ORDER BY id ASC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![max_retries, limit as i64], row_to_entry)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Remove an entry from the flush candidate set permanently.
    pub fn mark_sent(&self, id: i64) -> Result<(), StoreError> {
        self.conn
            .execute("UPDATE outbox SET sent = 1 WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Record a failed delivery attempt; the entry stays eligible for
    /// future drains until the retry ceiling.
    pub fn mark_failed(&self, id: i64, error: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE outbox SET retries = retries + 1, last_error = ?2 WHERE id = ?1",
            params![id, error],
        )?;
        Ok(())
    }

    /// Fetch one entry by id (tests and diagnostics).
    pub fn get_outbox_entry(&self, id: i64) -> Result<Option<OutboxEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, payload, session_id, retries, last_error, sent, created_at
             FROM outbox WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], row_to_entry)?;
        Ok(rows.next().transpose()?)
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<OutboxEntry> {
    Ok(OutboxEntry {
        id: row.get(0)?,
        kind: row.get(1)?,
        payload: row.get(2)?,
        session_id: row.get::<_, Option<String>>(3)?.map(SessionId::new),
        retries: row.get(4)?,
        last_error: row.get(5)?,
        sent: row.get::<_, i64>(6)? != 0,
        created_at: row.get(7)?,
    })
}

#[cfg(test)]
#[path = "outbox_tests.rs"]
mod tests;
