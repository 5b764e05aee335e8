// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol between the supervisor and worker subprocesses.
//!
//! Wire format: one JSON object per UTF-8 line. Supervisor messages ride the
//! child's stdin, worker messages its stdout. The `type` field discriminates;
//! stderr is a log channel and never parsed. Malformed lines and unknown
//! `type` values are dropped by the reader (and logged by the caller).

use crate::id::TaskId;
use crate::session::{HistoryEntry, SessionId, SessionSpec};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Messages written to a worker's stdin.
///
/// `WorkerInit` is always first and carries everything the worker needs to
/// build its agent; later messages reference the session implicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupervisorMsg {
    #[serde(rename_all = "camelCase")]
    WorkerInit {
        session_id: SessionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_name: Option<String>,
        spec: SessionSpec,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        project_path: Option<PathBuf>,
        workspace_path: PathBuf,
        /// Recent conversation history, for respawns after a restart.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        history: Vec<HistoryEntry>,
        /// Opaque configuration bundle forwarded from daemon settings.
        #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
        settings: serde_json::Value,
    },

    #[serde(rename_all = "camelCase")]
    WorkerTask {
        task_id: TaskId,
        content: String,
        /// Spec for this task; the worker rebuilds its agent when it changes.
        spec: SessionSpec,
    },

    #[serde(rename_all = "camelCase")]
    WorkerCancel { task_id: TaskId },

    /// Mid-task user input, folded into the running turn.
    #[serde(rename_all = "camelCase")]
    WorkerSteer { task_id: TaskId, content: String },

    /// Answer to an outstanding `WorkerQuestion`.
    #[serde(rename_all = "camelCase")]
    WorkerAnswer { tool_call_id: String, answer: String },

    #[serde(rename_all = "camelCase")]
    WorkerFormResponse {
        form_id: String,
        status: FormStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        values: Option<serde_json::Value>,
    },

    /// Graceful shutdown request; the worker finishes up and exits.
    WorkerClose,
}

/// Outcome of a form, as reported by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormStatus {
    Submitted,
    Cancelled,
}

/// Messages read from a worker's stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMsg {
    /// Emitted once after init; the worker is ready for a task.
    WorkerReady,

    #[serde(rename_all = "camelCase")]
    WorkerTaskStarted { task_id: TaskId },

    #[serde(rename_all = "camelCase")]
    WorkerTaskDone {
        task_id: TaskId,
        /// Final reply text for the user.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context_size: Option<u64>,
    },

    #[serde(rename_all = "camelCase")]
    WorkerTaskCancelled { task_id: TaskId },

    #[serde(rename_all = "camelCase")]
    WorkerError {
        message: String,
        /// Fatal errors end the worker; the supervisor respawns on demand.
        #[serde(default)]
        fatal: bool,
    },

    /// Short human-readable status line ("reading files", "running tests").
    #[serde(rename_all = "camelCase")]
    WorkerProgress { status: String },

    /// Streaming fragment of the reply being composed.
    #[serde(rename_all = "camelCase")]
    WorkerStreamText { text: String },

    #[serde(rename_all = "camelCase")]
    WorkerToolStart {
        tool_call_id: String,
        tool: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    WorkerToolEnd {
        tool_call_id: String,
        tool: String,
        ok: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },

    /// The agent needs a free-form answer before it can continue.
    #[serde(rename_all = "camelCase")]
    WorkerQuestion {
        tool_call_id: String,
        question: String,
    },

    /// The agent needs structured input before it can continue.
    #[serde(rename_all = "camelCase")]
    WorkerFormRequest {
        form_id: String,
        form: serde_json::Value,
    },

    #[serde(rename_all = "camelCase")]
    WorkerFileSend {
        file_name: String,
        /// Base64 blob, passed through to the remote service untouched.
        file_contents: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },

    /// The worker confirmed which project directory it operates in.
    #[serde(rename_all = "camelCase")]
    WorkerProjectSet { project_path: PathBuf },
}

/// Result of parsing one stdout line from a worker.
#[derive(Debug)]
pub enum LineParse {
    Message(WorkerMsg),
    /// Valid JSON with a `type` the supervisor does not know.
    UnknownType(String),
    /// Not a JSON object, or a known type with a bad shape.
    Malformed(String),
}

/// Parse one line of worker output.
///
/// Distinguishes unknown `type` tags from malformed JSON so the caller can
/// log them differently; both are dropped either way.
pub fn parse_worker_line(line: &str) -> LineParse {
    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return LineParse::Malformed(e.to_string()),
    };

    match serde_json::from_value::<WorkerMsg>(value.clone()) {
        Ok(msg) => LineParse::Message(msg),
        Err(e) => match value.get("type").and_then(|t| t.as_str()) {
            Some(kind) if !known_worker_type(kind) => LineParse::UnknownType(kind.to_string()),
            _ => LineParse::Malformed(e.to_string()),
        },
    }
}

fn known_worker_type(kind: &str) -> bool {
    matches!(
        kind,
        "WORKER_READY"
            | "WORKER_TASK_STARTED"
            | "WORKER_TASK_DONE"
            | "WORKER_TASK_CANCELLED"
            | "WORKER_ERROR"
            | "WORKER_PROGRESS"
            | "WORKER_STREAM_TEXT"
            | "WORKER_TOOL_START"
            | "WORKER_TOOL_END"
            | "WORKER_QUESTION"
            | "WORKER_FORM_REQUEST"
            | "WORKER_FILE_SEND"
            | "WORKER_PROJECT_SET"
    )
}

/// Encode a supervisor message as a single wire line (no trailing newline).
pub fn encode_line(msg: &SupervisorMsg) -> Result<String, serde_json::Error> {
    serde_json::to_string(msg)
}

#[cfg(test)]
#[path = "ipc_tests.rs"]
mod tests;
