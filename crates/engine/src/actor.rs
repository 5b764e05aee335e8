// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory session actor: queues, current task, and worker bookkeeping.
//!
//! One actor per active session, owned by the runtime and only ever touched
//! from the engine loop. The persisted session status is derived from the
//! actor state; the actor is authoritative while the daemon runs.

use milo_core::{
    MessageId, Priority, SessionId, SessionStatus, SessionType, TaskId, WorkItem,
};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Instant;

/// Lifecycle state of an actor's worker, distinct from the persisted
/// session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    /// Child created, init not yet acknowledged.
    Spawning,
    /// Worker ready, no task.
    Idle,
    /// One task dispatched, streaming events.
    Running,
    /// Cancel requested, awaiting confirmation.
    Cancelling,
    /// Worker asked a question or requested a form.
    WaitingUser,
    /// Close requested, graceful exit in progress.
    Dying,
    /// Child exited; eligible for respawn on next enqueue.
    Dead,
}

/// The one task an actor may have in flight.
#[derive(Debug, Clone)]
pub struct CurrentTask {
    pub task_id: TaskId,
    /// The inbound message that started this task.
    pub message_id: MessageId,
    pub started_at: Instant,
    pub cancel_requested_at: Option<Instant>,
}

/// Supervisor record for one session.
#[derive(Debug)]
pub struct SessionActor {
    pub session_id: SessionId,
    pub session_type: SessionType,
    pub state: ActorState,
    pub worker_pid: Option<u32>,
    pub current_task: Option<CurrentTask>,
    high: VecDeque<WorkItem>,
    normal: VecDeque<WorkItem>,
    /// Tool-call id of an outstanding `WORKER_QUESTION`.
    pub pending_question: Option<String>,
    /// Form id of an outstanding `WORKER_FORM_REQUEST`.
    pub pending_form: Option<String>,
    /// Confirmed project directory, if the worker has set one.
    pub project_path: Option<PathBuf>,
}

impl SessionActor {
    pub fn new(session_id: SessionId, session_type: SessionType) -> Self {
        Self {
            session_id,
            session_type,
            state: ActorState::Dead,
            worker_pid: None,
            current_task: None,
            high: VecDeque::new(),
            normal: VecDeque::new(),
            pending_question: None,
            pending_form: None,
            project_path: None,
        }
    }

    /// Queue a work item at its priority. FIFO within a tier.
    pub fn push(&mut self, item: WorkItem) {
        match item.priority() {
            Priority::High => self.high.push_back(item),
            Priority::Normal => self.normal.push_back(item),
        }
    }

    /// Put an item back at the front of its tier (failed dispatch).
    pub fn push_front(&mut self, item: WorkItem) {
        match item.priority() {
            Priority::High => self.high.push_front(item),
            Priority::Normal => self.normal.push_front(item),
        }
    }

    /// Next item to dispatch: high drains before normal.
    pub fn pop_next(&mut self) -> Option<WorkItem> {
        self.high.pop_front().or_else(|| self.normal.pop_front())
    }

    /// Drop queued control items (cancel/close are moot once the worker
    /// is gone).
    pub fn drain_high(&mut self) -> usize {
        let dropped = self.high.len();
        self.high.clear();
        dropped
    }

    /// Drop everything (explicit close).
    pub fn drain_all(&mut self) -> usize {
        let dropped = self.high.len() + self.normal.len();
        self.high.clear();
        self.normal.clear();
        dropped
    }

    pub fn queued(&self) -> usize {
        self.high.len() + self.normal.len()
    }

    pub fn has_queued(&self) -> bool {
        self.queued() > 0
    }

    /// Whether the actor currently owns a live child process.
    pub fn has_live_worker(&self) -> bool {
        !matches!(self.state, ActorState::Dead) && self.worker_pid.is_some()
    }

    /// Persisted session status derived from the actor state.
    pub fn derived_status(&self) -> SessionStatus {
        match self.state {
            ActorState::Spawning | ActorState::Idle | ActorState::Dead => SessionStatus::OpenIdle,
            ActorState::Running | ActorState::Cancelling | ActorState::Dying => {
                SessionStatus::OpenRunning
            }
            ActorState::WaitingUser => {
                if self.pending_form.is_some() {
                    SessionStatus::OpenInputRequired
                } else {
                    SessionStatus::OpenWaitingUser
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "actor_tests.rs"]
mod tests;
