// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake worker adapter for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{WorkerAdapter, WorkerAdapterError, WorkerHandle, WorkerSpawnConfig};
use async_trait::async_trait;
use milo_core::{Event, SessionId, SupervisorMsg, WorkerMsg};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Recorded call to FakeWorkerAdapter
#[derive(Debug, Clone)]
pub enum WorkerCall {
    Spawn { session_id: SessionId, pid: u32 },
    Send { session_id: SessionId, msg: SupervisorMsg },
    Terminate { session_id: SessionId },
    Kill { session_id: SessionId },
}

/// Fake worker adapter for testing.
///
/// Records every call, captures the messages "sent" to each worker, and
/// lets tests emit worker messages and exits into the engine loop.
#[derive(Clone, Default)]
pub struct FakeWorkerAdapter {
    inner: Arc<Mutex<FakeWorkerState>>,
}

#[derive(Default)]
struct FakeWorkerState {
    next_pid: u32,
    workers: HashMap<SessionId, FakeWorker>,
    alive_pids: HashSet<u32>,
    calls: Vec<WorkerCall>,
    spawn_error: Option<WorkerAdapterError>,
    send_error: Option<WorkerAdapterError>,
}

struct FakeWorker {
    pid: u32,
    event_tx: mpsc::Sender<Event>,
    sent: Vec<SupervisorMsg>,
}

impl FakeWorkerAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded calls.
    pub fn calls(&self) -> Vec<WorkerCall> {
        self.inner.lock().calls.clone()
    }

    /// Messages written to a session's worker, in order (init first).
    pub fn sent(&self, session_id: &SessionId) -> Vec<SupervisorMsg> {
        self.inner
            .lock()
            .workers
            .get(session_id)
            .map(|w| w.sent.clone())
            .unwrap_or_default()
    }

    /// Pid of the current fake worker for a session.
    pub fn pid(&self, session_id: &SessionId) -> Option<u32> {
        self.inner.lock().workers.get(session_id).map(|w| w.pid)
    }

    /// Number of spawn calls recorded.
    pub fn spawn_count(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, WorkerCall::Spawn { .. }))
            .count()
    }

    /// Fail the next spawn with the given error.
    pub fn set_spawn_error(&self, error: WorkerAdapterError) {
        self.inner.lock().spawn_error = Some(error);
    }

    /// Fail the next send with the given error.
    pub fn set_send_error(&self, error: WorkerAdapterError) {
        self.inner.lock().send_error = Some(error);
    }

    /// Mark a pid alive without a spawn (orphan tests).
    pub fn add_alive_pid(&self, pid: u32) {
        self.inner.lock().alive_pids.insert(pid);
    }

    /// Mark a pid dead (orphan poller sees it gone).
    pub fn remove_alive_pid(&self, pid: u32) {
        self.inner.lock().alive_pids.remove(&pid);
    }

    /// Emit a worker message into the engine loop, as if read from stdout.
    pub async fn emit(&self, session_id: &SessionId, msg: WorkerMsg) {
        let tx = {
            let inner = self.inner.lock();
            inner
                .workers
                .get(session_id)
                .map(|w| w.event_tx.clone())
        };
        if let Some(tx) = tx {
            let _ = tx
                .send(Event::WorkerEvent {
                    session_id: session_id.clone(),
                    msg,
                })
                .await;
        }
    }

    /// Emit a worker exit: pid becomes dead and the exit event is queued.
    pub async fn emit_exit(&self, session_id: &SessionId, exit_code: Option<i32>) {
        let tx = {
            let mut inner = self.inner.lock();
            match inner.workers.remove(session_id) {
                Some(worker) => {
                    inner.alive_pids.remove(&worker.pid);
                    Some(worker.event_tx)
                }
                None => None,
            }
        };
        if let Some(tx) = tx {
            let _ = tx
                .send(Event::WorkerExited {
                    session_id: session_id.clone(),
                    exit_code,
                })
                .await;
        }
    }
}

#[async_trait]
impl WorkerAdapter for FakeWorkerAdapter {
    async fn spawn(
        &self,
        config: WorkerSpawnConfig,
        event_tx: mpsc::Sender<Event>,
    ) -> Result<WorkerHandle, WorkerAdapterError> {
        let mut inner = self.inner.lock();
        if let Some(error) = inner.spawn_error.take() {
            return Err(error);
        }

        inner.next_pid += 1;
        let pid = 1000 + inner.next_pid;
        let session_id = config.session_id.clone();

        inner.calls.push(WorkerCall::Spawn {
            session_id: session_id.clone(),
            pid,
        });
        inner.alive_pids.insert(pid);
        inner.workers.insert(
            session_id.clone(),
            FakeWorker {
                pid,
                event_tx,
                sent: vec![config.init],
            },
        );

        Ok(WorkerHandle { session_id, pid })
    }

    async fn send(
        &self,
        session_id: &SessionId,
        msg: &SupervisorMsg,
    ) -> Result<(), WorkerAdapterError> {
        let mut inner = self.inner.lock();
        if let Some(error) = inner.send_error.take() {
            return Err(error);
        }
        inner.calls.push(WorkerCall::Send {
            session_id: session_id.clone(),
            msg: msg.clone(),
        });
        match inner.workers.get_mut(session_id) {
            Some(worker) => {
                worker.sent.push(msg.clone());
                Ok(())
            }
            None => Err(WorkerAdapterError::NotFound(session_id.to_string())),
        }
    }

    async fn terminate(&self, session_id: &SessionId) -> Result<(), WorkerAdapterError> {
        let mut inner = self.inner.lock();
        inner.calls.push(WorkerCall::Terminate {
            session_id: session_id.clone(),
        });
        if inner.workers.contains_key(session_id) {
            Ok(())
        } else {
            Err(WorkerAdapterError::NotFound(session_id.to_string()))
        }
    }

    async fn kill(&self, session_id: &SessionId) -> Result<(), WorkerAdapterError> {
        let mut inner = self.inner.lock();
        inner.calls.push(WorkerCall::Kill {
            session_id: session_id.clone(),
        });
        if inner.workers.contains_key(session_id) {
            Ok(())
        } else {
            Err(WorkerAdapterError::NotFound(session_id.to_string()))
        }
    }

    fn is_pid_alive(&self, pid: u32) -> bool {
        self.inner.lock().alive_pids.contains(&pid)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
