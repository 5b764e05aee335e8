// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sessions table: persisted session metadata and worker liveness.

use crate::store::{Store, StoreError};
use milo_core::{SessionId, SessionStatus, SessionType, WorkerState};
use rusqlite::params;
use std::path::PathBuf;

/// Persisted state of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub name: Option<String>,
    pub session_type: SessionType,
    pub status: SessionStatus,
    pub worker_pid: Option<u32>,
    pub worker_state: Option<WorkerState>,
    pub project_path: Option<PathBuf>,
    pub pending_tool_call: Option<String>,
    pub pending_form: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Store {
    /// Create the session row if absent, else refresh name/type. Status and
    /// worker columns are never clobbered here — they have their own
    /// updates below.
    pub fn upsert_session(
        &self,
        session_id: &SessionId,
        name: Option<&str>,
        session_type: SessionType,
    ) -> Result<(), StoreError> {
        let now = self.now();
        self.conn.execute(
            "INSERT INTO sessions (session_id, name, session_type, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(session_id) DO UPDATE SET
                 name = COALESCE(excluded.name, sessions.name),
                 session_type = excluded.session_type,
                 updated_at = excluded.updated_at",
            params![
                session_id.as_str(),
                name,
                session_type.as_str(),
                SessionStatus::OpenIdle.as_str(),
                now,
            ],
        )?;
        Ok(())
    }

    pub fn update_session_status(
        &self,
        session_id: &SessionId,
        status: SessionStatus,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE sessions SET status = ?2, updated_at = ?3 WHERE session_id = ?1",
            params![session_id.as_str(), status.as_str(), self.now()],
        )?;
        Ok(())
    }

    /// Record the worker's lifecycle state and pid. Passing `pid = None`
    /// clears the pid (worker gone).
    pub fn update_worker_state(
        &self,
        session_id: &SessionId,
        state: Option<WorkerState>,
        pid: Option<u32>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE sessions SET worker_state = ?2, worker_pid = ?3, updated_at = ?4
             WHERE session_id = ?1",
            params![
                session_id.as_str(),
                state.map(|s| s.as_str()),
                pid,
                self.now(),
            ],
        )?;
        Ok(())
    }

    pub fn update_confirmed_project(
        &self,
        session_id: &SessionId,
        project_path: &std::path::Path,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE sessions SET project_path = ?2, updated_at = ?3 WHERE session_id = ?1",
            params![
                session_id.as_str(),
                project_path.display().to_string(),
                self.now(),
            ],
        )?;
        Ok(())
    }

    /// Persist (or clear) the tool-call id a question is waiting on.
    pub fn set_pending_tool_call(
        &self,
        session_id: &SessionId,
        tool_call_id: Option<&str>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE sessions SET pending_tool_call = ?2, updated_at = ?3 WHERE session_id = ?1",
            params![session_id.as_str(), tool_call_id, self.now()],
        )?;
        Ok(())
    }

    /// Persist (or clear) the form id a form request is waiting on.
    pub fn set_pending_form(
        &self,
        session_id: &SessionId,
        form_id: Option<&str>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE sessions SET pending_form = ?2, updated_at = ?3 WHERE session_id = ?1",
            params![session_id.as_str(), form_id, self.now()],
        )?;
        Ok(())
    }

    pub fn get_session(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, StoreError> {
        let mut stmt = self.conn.prepare(SELECT_SESSION)?;
        let mut rows = stmt.query_map(params![session_id.as_str()], row_to_record)?;
        Ok(rows.next().transpose()?)
    }

    /// All sessions whose status is not CLOSED.
    pub fn get_active_sessions(&self) -> Result<Vec<SessionRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, name, session_type, status, worker_pid, worker_state,
                    project_path, pending_tool_call, pending_form, created_at, updated_at
             FROM sessions WHERE status != 'CLOSED'
             ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map([], row_to_record)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Session currently waiting on the given form id, if any.
    pub fn find_session_by_pending_form(
        &self,
        form_id: &str,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, name, session_type, status, worker_pid, worker_state,
                    project_path, pending_tool_call, pending_form, created_at, updated_at
             FROM sessions WHERE pending_form = ?1",
        )?;
        let mut rows = stmt.query_map(params![form_id], row_to_record)?;
        Ok(rows.next().transpose()?)
    }
}

const SELECT_SESSION: &str =
    "SELECT session_id, name, session_type, status, worker_pid, worker_state,
            project_path, pending_tool_call, pending_form, created_at, updated_at
     FROM sessions WHERE session_id = ?1";

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRecord> {
    let status_text: String = row.get(3)?;
    Ok(SessionRecord {
        session_id: SessionId::new(row.get::<_, String>(0)?),
        name: row.get(1)?,
        session_type: SessionType::parse(&row.get::<_, String>(2)?),
        status: SessionStatus::parse(&status_text).unwrap_or(SessionStatus::Errored),
        worker_pid: row.get(4)?,
        worker_state: row
            .get::<_, Option<String>>(5)?
            .and_then(|s| WorkerState::parse(&s)),
        project_path: row.get::<_, Option<String>>(6)?.map(PathBuf::from),
        pending_tool_call: row.get(7)?,
        pending_form: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
