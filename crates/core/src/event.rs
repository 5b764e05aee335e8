// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events processed by the orchestrator's engine loop.
//!
//! Everything that can change system state arrives here: inbound messages,
//! worker IPC traffic, process exits, fired timers, and recovery triggers.
//! The loop processes events sequentially; handlers may return follow-up
//! events that are fed back in.

use crate::id::TaskId;
use crate::inbound::Inbound;
use crate::ipc::WorkerMsg;
use crate::session::SessionId;
use crate::timer::TimerId;
use serde::{Deserialize, Serialize};

/// Events that trigger state transitions in the orchestrator.
///
/// Serializes with `{"type": "scope:name", ...fields}` format for logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- ingest --
    /// A payload arrived from pub/sub or the REST poll.
    #[serde(rename = "message:received")]
    MessageReceived { message: Inbound },

    /// Re-process unprocessed inbox rows (all sessions, or one).
    #[serde(rename = "inbox:redrive")]
    InboxRedrive {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<SessionId>,
    },

    // -- worker --
    /// A worker wrote a message on its stdout.
    #[serde(rename = "worker:event")]
    WorkerEvent {
        session_id: SessionId,
        msg: WorkerMsg,
    },

    /// The child process exited (any reason).
    #[serde(rename = "worker:exited")]
    WorkerExited {
        session_id: SessionId,
        exit_code: Option<i32>,
    },

    /// Spawning the child process failed outright.
    #[serde(rename = "worker:spawn_failed")]
    WorkerSpawnFailed {
        session_id: SessionId,
        error: String,
    },

    /// A dispatched task failed before the worker could report (spawn raced
    /// an exit, write to stdin failed).
    #[serde(rename = "worker:send_failed")]
    WorkerSendFailed {
        session_id: SessionId,
        task_id: Option<TaskId>,
        error: String,
    },

    // -- timers --
    #[serde(rename = "timer:fired")]
    TimerFired { id: TimerId },

    // -- recovery --
    /// A prior-run worker held over from before a restart has exited.
    #[serde(rename = "orphan:exited")]
    OrphanExited { session_id: SessionId },

    // -- lifecycle --
    /// Stop the daemon. Never replayed; control-signal only.
    #[serde(rename = "daemon:shutdown")]
    Shutdown,
}

impl Event {
    /// Session this event concerns, when it has one.
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Event::WorkerEvent { session_id, .. }
            | Event::WorkerExited { session_id, .. }
            | Event::WorkerSpawnFailed { session_id, .. }
            | Event::WorkerSendFailed { session_id, .. }
            | Event::OrphanExited { session_id } => Some(session_id),
            Event::InboxRedrive { session_id } => session_id.as_ref(),
            Event::MessageReceived { .. } | Event::TimerFired { .. } | Event::Shutdown => None,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
