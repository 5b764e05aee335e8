// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker subprocess adapter.
//!
//! The supervisor talks to each session's worker over line-delimited JSON on
//! the child's stdio (see `milo_core::ipc`). This module owns process
//! lifecycle: spawn with the init message, a reader per stdout, an exit
//! waiter, and the signal ladder for cancellation.

#[cfg(any(test, feature = "test-support"))]
mod fake;
mod process;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeWorkerAdapter, WorkerCall};
pub use process::ProcessWorkerAdapter;

use async_trait::async_trait;
use milo_core::{Event, SessionId, SupervisorMsg};
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from worker process operations.
#[derive(Debug, Clone, Error)]
pub enum WorkerAdapterError {
    #[error("failed to spawn worker: {0}")]
    SpawnFailed(String),

    #[error("no worker for session: {0}")]
    NotFound(String),

    #[error("failed to send to worker: {0}")]
    SendFailed(String),

    #[error("failed to signal worker: {0}")]
    SignalFailed(String),
}

/// Everything needed to start a worker for one session.
#[derive(Debug, Clone)]
pub struct WorkerSpawnConfig {
    pub session_id: SessionId,
    /// Worker binary path, supplied by daemon configuration.
    pub worker_bin: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
    /// The `WORKER_INIT` message, written before anything else.
    pub init: SupervisorMsg,
}

/// Descriptor of a live child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerHandle {
    pub session_id: SessionId,
    pub pid: u32,
}

/// Interface the engine uses to drive worker subprocesses.
#[async_trait]
pub trait WorkerAdapter: Clone + Send + Sync + 'static {
    /// Spawn a worker and begin pumping its stdout into `event_tx`.
    async fn spawn(
        &self,
        config: WorkerSpawnConfig,
        event_tx: mpsc::Sender<Event>,
    ) -> Result<WorkerHandle, WorkerAdapterError>;

    /// Write one message to the worker's stdin.
    async fn send(
        &self,
        session_id: &SessionId,
        msg: &SupervisorMsg,
    ) -> Result<(), WorkerAdapterError>;

    /// Escalation step: SIGTERM.
    async fn terminate(&self, session_id: &SessionId) -> Result<(), WorkerAdapterError>;

    /// Escalation step: SIGKILL.
    async fn kill(&self, session_id: &SessionId) -> Result<(), WorkerAdapterError>;

    /// Zero-signal probe of an arbitrary pid (orphan detection).
    fn is_pid_alive(&self, pid: u32) -> bool;
}
