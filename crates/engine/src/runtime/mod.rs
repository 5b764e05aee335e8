// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime for the Milo orchestrator engine

mod handlers;

use crate::actor::{ActorState, SessionActor};
use crate::models::ModelCatalog;
use crate::outbound::Outbound;
use crate::scheduler::Scheduler;
use crate::update::UpdateCoordinator;
use milo_adapters::{FsSkillStore, PersonaCache, PubSub, RemoteApi, WorkerAdapter};
use milo_core::{
    Clock, Event, EventPayload, MessageId, SessionId, SessionStatus, SessionType,
};
use milo_storage::{Sender, Store, TranscriptWriter};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Runtime path and identity configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Identity stamped on every published event.
    pub agent_id: String,
    /// Worker binary and fixed arguments, from daemon configuration.
    pub worker_bin: PathBuf,
    pub worker_args: Vec<String>,
    /// Workspace root handed to workers.
    pub workspace_dir: PathBuf,
    /// Per-session transcript directory.
    pub transcripts_dir: PathBuf,
    /// Persona cache directory (`PERSONAS/`).
    pub personas_dir: PathBuf,
    /// Skill tree (`SKILLS/`).
    pub skills_dir: PathBuf,
    /// Transient self-update script path.
    pub update_script: PathBuf,
    /// Update script output log.
    pub update_log: PathBuf,
    /// Daemon version, reported on update checks.
    pub version: String,
    /// Opaque settings bundle forwarded in `WORKER_INIT`.
    pub worker_settings: serde_json::Value,
}

/// Runtime adapter dependencies.
pub struct RuntimeDeps<W, R, P> {
    pub workers: W,
    pub remote: R,
    pub pubsub: P,
    pub store: Arc<Mutex<Store>>,
}

/// Runtime that coordinates the system.
pub struct Runtime<W, R, P, C: Clock> {
    pub(crate) workers: W,
    pub(crate) remote: R,
    pub(crate) outbound: Outbound<P>,
    pub(crate) store: Arc<Mutex<Store>>,
    pub(crate) scheduler: Arc<Mutex<Scheduler>>,
    pub(crate) clock: C,
    pub(crate) event_tx: mpsc::Sender<Event>,
    pub(crate) actors: Mutex<HashMap<SessionId, SessionActor>>,
    /// Sessions held for a prior-run worker that is still alive.
    pub(crate) orphans: Mutex<HashSet<SessionId>>,
    pub(crate) transcripts: TranscriptWriter,
    pub(crate) personas: PersonaCache,
    pub(crate) skills: FsSkillStore,
    pub(crate) models: ModelCatalog,
    pub(crate) update: UpdateCoordinator,
    pub(crate) config: RuntimeConfig,
}

impl<W, R, P, C> Runtime<W, R, P, C>
where
    W: WorkerAdapter,
    R: RemoteApi,
    P: PubSub,
    C: Clock,
{
    /// Create a new runtime.
    pub fn new(
        deps: RuntimeDeps<W, R, P>,
        clock: C,
        config: RuntimeConfig,
        event_tx: mpsc::Sender<Event>,
    ) -> Self {
        let outbound = Outbound::new(
            deps.pubsub,
            Arc::clone(&deps.store),
            config.agent_id.clone(),
        );
        Self {
            workers: deps.workers,
            remote: deps.remote,
            outbound,
            store: deps.store,
            scheduler: Arc::new(Mutex::new(Scheduler::new())),
            clock,
            event_tx,
            actors: Mutex::new(HashMap::new()),
            orphans: Mutex::new(HashSet::new()),
            transcripts: TranscriptWriter::new(config.transcripts_dir.clone()),
            personas: PersonaCache::new(config.personas_dir.clone()),
            skills: FsSkillStore::new(config.skills_dir.clone()),
            models: ModelCatalog::default(),
            update: UpdateCoordinator::new(
                config.update_script.clone(),
                config.update_log.clone(),
                config.version.clone(),
            ),
            config,
        }
    }

    /// Get a reference to the clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Shared scheduler handle for the daemon's timer tick.
    pub fn scheduler(&self) -> Arc<Mutex<Scheduler>> {
        Arc::clone(&self.scheduler)
    }

    /// The outbound pipeline (daemon shutdown uses it directly).
    pub fn outbound(&self) -> &Outbound<P> {
        &self.outbound
    }

    /// Helper to lock the store for a batch of synchronous calls.
    pub(crate) fn lock_store<T>(&self, f: impl FnOnce(&Store) -> T) -> T {
        let store = self.store.lock();
        f(&store)
    }

    /// Zero-signal pid probe, exposed for the daemon's orphan pollers.
    pub fn probe_pid(&self, pid: u32) -> bool {
        self.workers.is_pid_alive(pid)
    }

    /// Mark a session as held for a prior-run worker (orphan).
    pub fn hold_orphan(&self, session_id: SessionId) {
        self.orphans.lock().insert(session_id);
    }

    /// Whether a session is currently orphan-held.
    pub fn is_orphaned(&self, session_id: &SessionId) -> bool {
        self.orphans.lock().contains(session_id)
    }

    /// Display names of sessions that are active right now (heartbeat).
    pub fn active_session_names(&self) -> Vec<String> {
        self.lock_store(|store| {
            store
                .get_active_sessions()
                .map(|sessions| {
                    sessions
                        .into_iter()
                        .map(|s| s.name.unwrap_or_else(|| s.session_id.to_string()))
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    /// Apply a status change everywhere it is observed: store, pub/sub,
    /// and (fire-and-forget) the REST session resource.
    pub(crate) async fn set_session_status(&self, session_id: &SessionId, status: SessionStatus) {
        if let Err(e) =
            self.lock_store(|store| store.update_session_status(session_id, status))
        {
            tracing::error!(session_id = %session_id, error = %e, "failed to persist session status");
        }

        self.outbound
            .publish(EventPayload::SessionStatusChanged {
                session_id: session_id.clone(),
                session_status: status,
            })
            .await;

        let remote = self.remote.clone();
        let sid = session_id.clone();
        tokio::spawn(async move {
            if let Err(e) = remote.patch_session(&sid, status).await {
                tracing::debug!(session_id = %sid, error = %e, "session PATCH failed");
            }
        });
    }

    /// Append to both audit sinks: the session_log table and the Markdown
    /// transcript.
    pub(crate) fn audit(
        &self,
        session_id: &SessionId,
        sender: Sender,
        content: &str,
        message_id: Option<&MessageId>,
    ) {
        if let Err(e) = self.lock_store(|store| {
            store.insert_session_message(session_id, sender, content, message_id)
        }) {
            tracing::error!(session_id = %session_id, error = %e, "failed to write audit entry");
        }
        self.transcripts.append(session_id, sender.as_str(), content);
    }

    /// Run `f` against the actor for a session, creating the record first
    /// if needed. Returns `f`'s result.
    pub(crate) fn with_actor<T>(
        &self,
        session_id: &SessionId,
        session_type: SessionType,
        f: impl FnOnce(&mut SessionActor) -> T,
    ) -> T {
        let mut actors = self.actors.lock();
        let actor = actors
            .entry(session_id.clone())
            .or_insert_with(|| SessionActor::new(session_id.clone(), session_type));
        f(actor)
    }

    /// Run `f` against an existing actor, if there is one.
    pub(crate) fn with_existing_actor<T>(
        &self,
        session_id: &SessionId,
        f: impl FnOnce(&mut SessionActor) -> T,
    ) -> Option<T> {
        let mut actors = self.actors.lock();
        actors.get_mut(session_id).map(f)
    }

    /// Snapshot of an actor's state, for tests and status replies.
    pub fn actor_state(&self, session_id: &SessionId) -> Option<ActorState> {
        self.actors.lock().get(session_id).map(|a| a.state)
    }

    /// Queued work items on an actor, for tests and status replies.
    pub fn actor_queue_len(&self, session_id: &SessionId) -> usize {
        self.actors
            .lock()
            .get(session_id)
            .map(|a| a.queued())
            .unwrap_or(0)
    }

    pub(crate) fn set_timer(&self, id: milo_core::TimerId, delay: std::time::Duration) {
        let now = self.clock.now();
        self.scheduler.lock().set_timer(id, delay, now);
    }

    pub(crate) fn cancel_timer(&self, id: &milo_core::TimerId) {
        self.scheduler.lock().cancel_timer(id);
    }

    pub(crate) fn cancel_session_timers(&self, session_id: &SessionId) {
        self.scheduler.lock().cancel_session_timers(session_id);
    }
}

#[cfg(test)]
#[path = "../runtime_tests/mod.rs"]
mod tests;
