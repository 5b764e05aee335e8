// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash recovery: startup reconciliation, orphan release, inbox redrive.

use crate::error::RuntimeError;
use crate::runtime::handlers::ingest::RouteParams;
use crate::runtime::Runtime;
use milo_adapters::{PubSub, RemoteApi, WorkerAdapter};
use milo_core::{Clock, Event, SessionId, SessionStatus, SessionType};
use milo_storage::{InboxEntry, Sender};

impl<W, R, P, C> Runtime<W, R, P, C>
where
    W: WorkerAdapter,
    R: RemoteApi,
    P: PubSub,
    C: Clock,
{
    /// Reconcile persisted sessions with the live process table at startup.
    ///
    /// A session whose recorded worker pid is still alive is *orphaned*: a
    /// second worker must never target the same workspace, so the session
    /// is held and the caller polls the pid. Sessions whose worker is gone
    /// are closed immediately.
    pub async fn recover_startup_sessions(
        &self,
    ) -> Result<Vec<(SessionId, u32)>, RuntimeError> {
        let sessions = self.lock_store(|store| store.get_active_sessions())?;
        let mut orphans = Vec::new();

        for record in sessions {
            let session_id = record.session_id.clone();
            match record.worker_pid {
                Some(pid) if self.workers.is_pid_alive(pid) => {
                    tracing::warn!(
                        session_id = %session_id,
                        pid,
                        "prior-run worker still alive, holding session"
                    );
                    self.hold_orphan(session_id.clone());
                    self.audit(
                        &session_id,
                        Sender::System,
                        &format!("prior worker (pid {}) still running; session held", pid),
                        None,
                    );
                    self.set_session_status(&session_id, SessionStatus::OpenPaused)
                        .await;
                    orphans.push((session_id, pid));
                }
                _ => {
                    tracing::info!(
                        session_id = %session_id,
                        pid = ?record.worker_pid,
                        "closing stale session at startup"
                    );
                    self.lock_store(|store| {
                        store.update_worker_state(&session_id, None, None)?;
                        store.set_pending_tool_call(&session_id, None)?;
                        store.set_pending_form(&session_id, None)
                    })?;
                    self.audit(
                        &session_id,
                        Sender::System,
                        "session closed at startup (worker gone)",
                        None,
                    );
                    self.set_session_status(&session_id, SessionStatus::Closed)
                        .await;
                }
            }
        }

        Ok(orphans)
    }

    /// The held prior-run worker finally exited: close the old session
    /// state and redrive whatever arrived in the meantime.
    pub(crate) async fn handle_orphan_exited(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Event>, RuntimeError> {
        self.orphans.lock().remove(session_id);
        tracing::info!(session_id = %session_id, "orphaned worker exited, recovering session");

        self.lock_store(|store| store.update_worker_state(session_id, None, None))?;
        self.audit(
            session_id,
            Sender::System,
            "prior-run worker exited; session recovered",
            None,
        );
        self.set_session_status(session_id, SessionStatus::Closed)
            .await;

        let deferred =
            self.lock_store(|store| store.get_unprocessed_for_session(session_id))?;
        self.redrive_entries(deferred).await
    }

    /// Re-route unprocessed inbox rows (startup, or one session's deferred
    /// backlog).
    pub(crate) async fn handle_inbox_redrive(
        &self,
        session_id: Option<SessionId>,
    ) -> Result<Vec<Event>, RuntimeError> {
        let entries = self.lock_store(|store| match session_id {
            Some(ref sid) => store.get_unprocessed_for_session(sid),
            None => store.get_unprocessed(10_000),
        })?;
        self.redrive_entries(entries).await
    }

    async fn redrive_entries(
        &self,
        entries: Vec<InboxEntry>,
    ) -> Result<Vec<Event>, RuntimeError> {
        if entries.is_empty() {
            return Ok(vec![]);
        }
        tracing::info!(count = entries.len(), "redriving unprocessed inbox rows");

        let mut events = Vec::new();
        for entry in entries {
            // Receipt-time steps (ack, session upsert, audit) already ran
            // when the row was first inserted; only routing is replayed.
            events.extend(
                self.route_message(RouteParams {
                    message_id: entry.message_id,
                    session_id: entry.session_id,
                    session_type: SessionType::parse(&entry.session_type),
                    content: entry.content,
                    ui_action: entry.ui_action,
                    persona: None,
                    model: None,
                })
                .await?,
            );
        }
        Ok(events)
    }
}
