// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production worker adapter backed by real child processes.

use super::{WorkerAdapter, WorkerAdapterError, WorkerHandle, WorkerSpawnConfig};
use async_trait::async_trait;
use milo_core::{encode_line, parse_worker_line, Event, LineParse, SessionId, SupervisorMsg};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;

/// Worker adapter that spawns the configured worker binary per session.
#[derive(Clone, Default)]
pub struct ProcessWorkerAdapter {
    workers: Arc<Mutex<HashMap<SessionId, WorkerProc>>>,
}

struct WorkerProc {
    pid: u32,
    stdin: Arc<tokio::sync::Mutex<ChildStdin>>,
}

impl ProcessWorkerAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn pid_of(&self, session_id: &SessionId) -> Result<u32, WorkerAdapterError> {
        self.workers
            .lock()
            .get(session_id)
            .map(|w| w.pid)
            .ok_or_else(|| WorkerAdapterError::NotFound(session_id.to_string()))
    }

    fn signal(&self, session_id: &SessionId, signal: Signal) -> Result<(), WorkerAdapterError> {
        let pid = self.pid_of(session_id)?;
        kill(Pid::from_raw(pid as i32), signal)
            .map_err(|e| WorkerAdapterError::SignalFailed(format!("{} pid {}: {}", signal, pid, e)))
    }
}

#[async_trait]
impl WorkerAdapter for ProcessWorkerAdapter {
    async fn spawn(
        &self,
        config: WorkerSpawnConfig,
        event_tx: mpsc::Sender<Event>,
    ) -> Result<WorkerHandle, WorkerAdapterError> {
        let session_id = config.session_id.clone();

        tracing::debug!(
            session_id = %session_id,
            worker_bin = %config.worker_bin.display(),
            cwd = %config.cwd.display(),
            "spawning worker"
        );

        if !config.cwd.exists() {
            return Err(WorkerAdapterError::SpawnFailed(format!(
                "working directory does not exist: {}",
                config.cwd.display()
            )));
        }

        let mut child = Command::new(&config.worker_bin)
            .args(&config.args)
            .current_dir(&config.cwd)
            .envs(config.env.iter().cloned())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| WorkerAdapterError::SpawnFailed(e.to_string()))?;

        let pid = child
            .id()
            .ok_or_else(|| WorkerAdapterError::SpawnFailed("child exited at spawn".into()))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| WorkerAdapterError::SpawnFailed("no stdin pipe".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| WorkerAdapterError::SpawnFailed("no stdout pipe".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| WorkerAdapterError::SpawnFailed("no stderr pipe".into()))?;

        // WORKER_INIT is always the first line the child reads.
        let init_line = encode_line(&config.init)
            .map_err(|e| WorkerAdapterError::SpawnFailed(format!("encode init: {}", e)))?;
        stdin
            .write_all(format!("{}\n", init_line).as_bytes())
            .await
            .map_err(|e| WorkerAdapterError::SpawnFailed(format!("write init: {}", e)))?;

        spawn_stdout_reader(session_id.clone(), stdout, event_tx.clone());
        spawn_stderr_reader(session_id.clone(), stderr);
        spawn_exit_waiter(
            session_id.clone(),
            child,
            Arc::clone(&self.workers),
            event_tx,
        );

        self.workers.lock().insert(
            session_id.clone(),
            WorkerProc {
                pid,
                stdin: Arc::new(tokio::sync::Mutex::new(stdin)),
            },
        );

        tracing::info!(session_id = %session_id, pid, "worker spawned");

        Ok(WorkerHandle { session_id, pid })
    }

    async fn send(
        &self,
        session_id: &SessionId,
        msg: &SupervisorMsg,
    ) -> Result<(), WorkerAdapterError> {
        let stdin = {
            let workers = self.workers.lock();
            workers
                .get(session_id)
                .map(|w| Arc::clone(&w.stdin))
                .ok_or_else(|| WorkerAdapterError::NotFound(session_id.to_string()))?
        };

        let line =
            encode_line(msg).map_err(|e| WorkerAdapterError::SendFailed(e.to_string()))?;

        let mut stdin = stdin.lock().await;
        stdin
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .map_err(|e| WorkerAdapterError::SendFailed(e.to_string()))?;
        stdin
            .flush()
            .await
            .map_err(|e| WorkerAdapterError::SendFailed(e.to_string()))
    }

    async fn terminate(&self, session_id: &SessionId) -> Result<(), WorkerAdapterError> {
        tracing::info!(session_id = %session_id, "sending SIGTERM to worker");
        self.signal(session_id, Signal::SIGTERM)
    }

    async fn kill(&self, session_id: &SessionId) -> Result<(), WorkerAdapterError> {
        tracing::warn!(session_id = %session_id, "sending SIGKILL to worker");
        self.signal(session_id, Signal::SIGKILL)
    }

    fn is_pid_alive(&self, pid: u32) -> bool {
        // Zero-signal probe. EPERM means the pid exists but is not ours.
        match kill(Pid::from_raw(pid as i32), None) {
            Ok(()) => true,
            Err(nix::errno::Errno::EPERM) => true,
            Err(_) => false,
        }
    }
}

fn spawn_stdout_reader(
    session_id: SessionId,
    stdout: tokio::process::ChildStdout,
    event_tx: mpsc::Sender<Event>,
) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match parse_worker_line(trimmed) {
                        LineParse::Message(msg) => {
                            let event = Event::WorkerEvent {
                                session_id: session_id.clone(),
                                msg,
                            };
                            if event_tx.send(event).await.is_err() {
                                return; // Engine gone; stop reading
                            }
                        }
                        LineParse::UnknownType(kind) => {
                            tracing::warn!(
                                session_id = %session_id,
                                kind,
                                "dropping worker message with unknown type"
                            );
                        }
                        LineParse::Malformed(error) => {
                            tracing::warn!(
                                session_id = %session_id,
                                error,
                                "dropping malformed worker line"
                            );
                        }
                    }
                }
                Ok(None) => return, // EOF; exit waiter reports the close
                Err(e) => {
                    tracing::warn!(session_id = %session_id, error = %e, "worker stdout read failed");
                    return;
                }
            }
        }
    });
}

/// Stderr is the worker's log channel; forward lines unparsed.
fn spawn_stderr_reader(session_id: SessionId, stderr: tokio::process::ChildStderr) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::debug!(session_id = %session_id, "worker: {}", line);
        }
    });
}

fn spawn_exit_waiter(
    session_id: SessionId,
    mut child: Child,
    workers: Arc<Mutex<HashMap<SessionId, WorkerProc>>>,
    event_tx: mpsc::Sender<Event>,
) {
    tokio::spawn(async move {
        let exit_code = match child.wait().await {
            Ok(status) => status.code(),
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "worker wait failed");
                None
            }
        };

        workers.lock().remove(&session_id);

        tracing::info!(session_id = %session_id, ?exit_code, "worker exited");
        let _ = event_tx
            .send(Event::WorkerExited {
                session_id,
                exit_code,
            })
            .await;
    });
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
