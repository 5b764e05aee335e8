// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session model: identity, type, lifecycle status, worker state.
//!
//! A session is a user-scoped conversational unit. Its id is minted by the
//! remote service; the daemon only ever observes it. The persisted
//! `SessionStatus` is derived from the in-memory actor state — the actor is
//! authoritative while the daemon is running.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Globally unique session identifier, minted by the remote service.
    pub struct SessionId;
}

/// Kind of session, set by the remote service on the first message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Chat,
    Bot,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Chat => "chat",
            SessionType::Bot => "bot",
        }
    }

    /// Parse from the stored/wire string. Unknown values map to `Bot`.
    pub fn parse(s: &str) -> Self {
        match s {
            "chat" => SessionType::Chat,
            _ => SessionType::Bot,
        }
    }
}

/// Persisted lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    OpenIdle,
    OpenRunning,
    OpenWaitingUser,
    OpenInputRequired,
    OpenPaused,
    Closed,
    Errored,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::OpenIdle => "OPEN_IDLE",
            SessionStatus::OpenRunning => "OPEN_RUNNING",
            SessionStatus::OpenWaitingUser => "OPEN_WAITING_USER",
            SessionStatus::OpenInputRequired => "OPEN_INPUT_REQUIRED",
            SessionStatus::OpenPaused => "OPEN_PAUSED",
            SessionStatus::Closed => "CLOSED",
            SessionStatus::Errored => "ERRORED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPEN_IDLE" => Some(SessionStatus::OpenIdle),
            "OPEN_RUNNING" => Some(SessionStatus::OpenRunning),
            "OPEN_WAITING_USER" => Some(SessionStatus::OpenWaitingUser),
            "OPEN_INPUT_REQUIRED" => Some(SessionStatus::OpenInputRequired),
            "OPEN_PAUSED" => Some(SessionStatus::OpenPaused),
            "CLOSED" => Some(SessionStatus::Closed),
            "ERRORED" => Some(SessionStatus::Errored),
            _ => None,
        }
    }

    /// A session is active until explicitly closed.
    pub fn is_active(&self) -> bool {
        !matches!(self, SessionStatus::Closed)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last-known lifecycle state of a session's worker process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Starting,
    Ready,
    Busy,
    Dead,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Starting => "starting",
            WorkerState::Ready => "ready",
            WorkerState::Busy => "busy",
            WorkerState::Dead => "dead",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "starting" => Some(WorkerState::Starting),
            "ready" => Some(WorkerState::Ready),
            "busy" => Some(WorkerState::Busy),
            "dead" => Some(WorkerState::Dead),
            _ => None,
        }
    }
}

/// Persona reference carried on a user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaRef {
    pub persona_id: String,
    pub persona_version_id: String,
}

impl PersonaRef {
    /// File name under the persona cache directory.
    pub fn file_name(&self) -> String {
        format!("{}--{}.md", self.persona_id, self.persona_version_id)
    }
}

/// How a worker should configure its agent for a session.
///
/// Handed to the worker at spawn and on each task; the worker re-creates its
/// agent only when the spec changes between tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSpec {
    pub session_type: SessionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<PersonaRef>,
    /// Per-message model override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl SessionSpec {
    pub fn new(session_type: SessionType) -> Self {
        Self {
            session_type,
            persona: None,
            model: None,
        }
    }
}

/// One prior message, as returned by the message history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub sender: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
