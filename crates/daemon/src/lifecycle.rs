// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, recovery.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use milo_adapters::{HttpPubSub, HttpRemote, ProcessWorkerAdapter};
use milo_core::{Event, SessionId, SystemClock};
use milo_engine::{Runtime, RuntimeConfig, RuntimeDeps, UpdateCoordinator};
use milo_storage::Store;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

/// Daemon runtime with concrete adapter types.
pub type DaemonRuntime =
    Runtime<ProcessWorkerAdapter, HttpRemote, HttpPubSub<HttpRemote>, SystemClock>;

/// Daemon configuration: fixed paths under the state directory.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/milo). Also the workspace
    /// root handed to workers.
    pub state_dir: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to the embedded database
    pub db_path: PathBuf,
    /// Per-session transcript files
    pub transcripts_path: PathBuf,
    /// Persona cache
    pub personas_path: PathBuf,
    /// Skill tree
    pub skills_path: PathBuf,
    /// Per-project directories
    pub projects_path: PathBuf,
    /// Transient self-update script
    pub update_script_path: PathBuf,
    /// Update script output log
    pub update_log_path: PathBuf,
    /// Secrets file (API key fallback)
    pub env_file_path: PathBuf,
}

impl Config {
    /// Load configuration for the user-level daemon. One daemon owns one
    /// workspace.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = crate::env::state_dir().ok_or(LifecycleError::NoStateDir)?;
        Ok(Self::at(state_dir))
    }

    /// Configuration rooted at an explicit directory (tests).
    pub fn at(state_dir: PathBuf) -> Self {
        Self {
            lock_path: state_dir.join("milod.pid"),
            version_path: state_dir.join("milod.version"),
            log_path: state_dir.join("milod.log"),
            db_path: state_dir.join("milo.db"),
            transcripts_path: state_dir.join("transcripts"),
            personas_path: state_dir.join("PERSONAS"),
            skills_path: state_dir.join("SKILLS"),
            projects_path: state_dir.join("PROJECTS"),
            update_script_path: state_dir.join(".update-daemon.sh"),
            update_log_path: state_dir.join("update.log"),
            env_file_path: state_dir.join(".env"),
            state_dir,
        }
    }
}

/// Daemon state during operation.
pub struct DaemonState {
    /// Configuration
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Durable store (shared with the runtime)
    pub store: Arc<Mutex<Store>>,
    /// Runtime for event processing
    pub runtime: Arc<DaemonRuntime>,
    /// When the daemon started
    pub start_time: Instant,
}

/// Result of daemon startup.
pub struct StartupResult {
    /// The daemon state for event processing
    pub daemon: DaemonState,
    /// Receiving side of the event bus
    pub event_rx: mpsc::Receiver<Event>,
    /// Sending side, for background tasks
    pub event_tx: mpsc::Sender<Event>,
    /// Pub/sub client (subscriber task + connected flag)
    pub pubsub: HttpPubSub<HttpRemote>,
    /// REST client for the heartbeat/poll ticker
    pub remote: HttpRemote,
    /// Prior-run workers still alive; each needs a poller
    pub orphans: Vec<(SessionId, u32)>,
}

impl DaemonState {
    /// Process an event through the runtime; follow-up events are fed back
    /// iteratively. Returns true when a shutdown was requested.
    pub async fn process_event(&self, event: Event) -> bool {
        let mut shutdown = false;
        let mut pending = vec![event];

        while let Some(event) = pending.pop() {
            if matches!(event, Event::Shutdown) {
                shutdown = true;
                continue;
            }
            match self.runtime.handle_event(event).await {
                Ok(result_events) => pending.extend(result_events),
                Err(e) => {
                    // Unprocessable events must not wedge the loop; the
                    // durable inbox/outbox rows make retries possible later.
                    tracing::error!(error = %e, "error processing event");
                }
            }
        }

        shutdown
    }

    /// Shutdown the daemon gracefully: sign off, give workers their grace
    /// window, kill stragglers, attempt a final outbox flush, then release
    /// the lock files.
    pub async fn shutdown(&self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        self.runtime.begin_shutdown().await;
        tokio::time::sleep(crate::env::shutdown_grace()).await;
        self.runtime.kill_remaining().await;

        // Whatever the flusher did not get to, try once more now.
        match self.runtime.flush_outbox().await {
            Ok(delivered) if delivered > 0 => {
                info!(delivered, "final outbox flush on shutdown")
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "final outbox flush failed"),
        }

        for path in [&self.config.version_path, &self.config.lock_path] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove file");
                }
            }
        }

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] milo_storage::StoreError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] milo_engine::RuntimeError),

    #[error("Remote error: {0}")]
    Remote(#[from] milo_adapters::RemoteError),

    #[error("Pub/sub error: {0}")]
    PubSub(#[from] milo_adapters::PubSubError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon.
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Don't clean up if we failed to acquire the lock —
            // those files belong to the already-running daemon.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    // 1. State directory first; everything lives under it.
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire the lock before touching shared files. Open without
    // truncating so a losing race does not wipe the running daemon's pid.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    use std::io::Write;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Workspace directories.
    for dir in [
        &config.transcripts_path,
        &config.personas_path,
        &config.skills_path,
        &config.projects_path,
    ] {
        std::fs::create_dir_all(dir)?;
    }

    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    // 4. A leftover update script means the previous run updated us; the
    // log keeps the tail of that story.
    UpdateCoordinator::new(
        config.update_script_path.clone(),
        config.update_log_path.clone(),
        env!("CARGO_PKG_VERSION").to_string(),
    )
    .cleanup();

    // 5. Open the store.
    let store = Arc::new(Mutex::new(Store::open(&config.db_path)?));

    // 6. Production adapters.
    let api_key = crate::env::api_key().or_else(|| read_env_file_key(&config.env_file_path));
    if api_key.is_none() {
        tracing::warn!("no API key configured; REST calls will be unauthenticated");
    }
    let remote = HttpRemote::new(crate::env::api_url(), api_key)?;
    let pubsub = HttpPubSub::new(crate::env::pubsub_url(), remote.clone())?;
    let workers = ProcessWorkerAdapter::new();

    // 7. Event bus and runtime.
    let (event_tx, event_rx) = mpsc::channel::<Event>(256);
    let runtime = Arc::new(Runtime::new(
        RuntimeDeps {
            workers,
            remote: remote.clone(),
            pubsub: pubsub.clone(),
            store: Arc::clone(&store),
        },
        SystemClock,
        RuntimeConfig {
            agent_id: "milo".into(),
            worker_bin: crate::env::worker_bin(),
            worker_args: vec![],
            workspace_dir: config.state_dir.clone(),
            transcripts_dir: config.transcripts_path.clone(),
            personas_dir: config.personas_path.clone(),
            skills_dir: config.skills_path.clone(),
            update_script: config.update_script_path.clone(),
            update_log: config.update_log_path.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            worker_settings: serde_json::Value::Null,
        },
        event_tx.clone(),
    ));

    // 8. Reconcile persisted sessions against the live process table. A
    // crash-restart must never spawn a second worker for a session whose
    // prior worker is still alive.
    let orphans = runtime.recover_startup_sessions().await?;

    // 9. Redrive whatever the previous run left unprocessed (orphaned
    // sessions stay deferred until their poller releases them).
    if event_tx
        .send(Event::InboxRedrive { session_id: None })
        .await
        .is_err()
    {
        tracing::warn!("event bus closed before startup redrive");
    }

    info!("Daemon started");

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            store,
            runtime,
            start_time: Instant::now(),
        },
        event_rx,
        event_tx,
        pubsub,
        remote,
        orphans,
    })
}

/// Pull `MILO_API_KEY=...` out of the workspace `.env` file.
pub(crate) fn read_env_file_key(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    content.lines().find_map(|line| {
        let line = line.trim();
        let value = line.strip_prefix("MILO_API_KEY=")?.trim();
        let value = value.trim_matches('"').trim_matches('\'');
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    for path in [&config.version_path, &config.lock_path] {
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
