// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbox: received-message deduplication and the processing flag.

use crate::store::{Store, StoreError};
use milo_core::{MessageId, SessionId};
use rusqlite::params;

/// A received message as stored for deduplication and redrive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxEntry {
    pub message_id: MessageId,
    pub session_id: SessionId,
    pub session_type: String,
    pub content: String,
    pub session_name: Option<String>,
    pub ui_action: Option<String>,
    pub received_at: String,
    pub processed: bool,
}

/// Fields of a new inbox row; the store stamps the timestamp.
#[derive(Debug, Clone)]
pub struct NewInboxEntry<'a> {
    pub message_id: &'a MessageId,
    pub session_id: &'a SessionId,
    pub session_type: &'a str,
    pub content: &'a str,
    pub session_name: Option<&'a str>,
    pub ui_action: Option<&'a str>,
}

impl Store {
    /// Record a received message. Returns `false` iff a row with this
    /// `message_id` already existed — the duplicate is silently ignored.
    pub fn insert_inbox(&self, entry: NewInboxEntry<'_>) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO inbox
                (message_id, session_id, session_type, content, session_name, ui_action, received_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.message_id.as_str(),
                entry.session_id.as_str(),
                entry.session_type,
                entry.content,
                entry.session_name,
                entry.ui_action,
                self.now(),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Mark a message processed. Idempotent; unknown ids are a no-op.
    pub fn mark_processed(&self, message_id: &MessageId) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE inbox SET processed = 1 WHERE message_id = ?1",
            params![message_id.as_str()],
        )?;
        Ok(())
    }

    /// Unprocessed messages, oldest first.
    pub fn get_unprocessed(&self, limit: usize) -> Result<Vec<InboxEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT message_id, session_id, session_type, content, session_name, ui_action,
                    received_at, processed
             FROM inbox WHERE processed = 0
             ORDER BY received_at ASC, rowid ASC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], row_to_entry)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Unprocessed messages for one session, oldest first (orphan redrive).
    pub fn get_unprocessed_for_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<InboxEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT message_id, session_id, session_type, content, session_name, ui_action,
                    received_at, processed
             FROM inbox WHERE processed = 0 AND session_id = ?1
             ORDER BY received_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![session_id.as_str()], row_to_entry)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<InboxEntry> {
    Ok(InboxEntry {
        message_id: MessageId::new(row.get::<_, String>(0)?),
        session_id: SessionId::new(row.get::<_, String>(1)?),
        session_type: row.get(2)?,
        content: row.get(3)?,
        session_name: row.get(4)?,
        ui_action: row.get(5)?,
        received_at: row.get(6)?,
        processed: row.get::<_, i64>(7)? != 0,
    })
}

#[cfg(test)]
#[path = "inbox_tests.rs"]
mod tests;
