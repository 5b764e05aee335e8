// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only session audit log.

use crate::store::{Store, StoreError};
use milo_core::{MessageId, SessionId};
use rusqlite::params;

/// Who produced an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Agent,
    System,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Agent => "agent",
            Sender::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Sender::User),
            "agent" => Some(Sender::Agent),
            "system" => Some(Sender::System),
            _ => None,
        }
    }
}

/// One audit log row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLogEntry {
    pub id: i64,
    pub session_id: SessionId,
    pub sender: String,
    pub content: String,
    pub message_id: Option<MessageId>,
    pub created_at: String,
}

impl Store {
    /// Append one entry to a session's audit log.
    pub fn insert_session_message(
        &self,
        session_id: &SessionId,
        sender: Sender,
        content: &str,
        message_id: Option<&MessageId>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO session_log (session_id, sender, content, message_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session_id.as_str(),
                sender.as_str(),
                content,
                message_id.map(|m| m.as_str()),
                self.now(),
            ],
        )?;
        Ok(())
    }

    /// The most recent `limit` entries for a session, oldest first.
    pub fn get_session_messages(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<SessionLogEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, sender, content, message_id, created_at
             FROM (SELECT * FROM session_log WHERE session_id = ?1 ORDER BY id DESC LIMIT ?2)
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![session_id.as_str(), limit as i64], |row| {
            Ok(SessionLogEntry {
                id: row.get(0)?,
                session_id: SessionId::new(row.get::<_, String>(1)?),
                sender: row.get(2)?,
                content: row.get(3)?,
                message_id: row.get::<_, Option<String>>(4)?.map(MessageId::new),
                created_at: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
#[path = "session_log_tests.rs"]
mod tests;
