// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime tests

mod cancel;
mod control;
mod crash;
mod dispatch;
mod flush;
mod ingest;
mod orphan;
mod shutdown;
mod steering;

use super::*;
use crate::actor::ActorState;
use crate::runtime::{RuntimeConfig, RuntimeDeps};
use milo_adapters::{FakePubSub, FakeRemote, FakeWorkerAdapter, WorkerCall};
use milo_core::{
    Event, EventPayload, FakeClock, Inbound, MessageId, SendPayload, SessionId, SessionStatus,
    SupervisorMsg, WorkerMsg,
};
use milo_storage::{OutboxEntry, Store};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::mpsc;

type TestRuntime = Runtime<FakeWorkerAdapter, FakeRemote, FakePubSub, FakeClock>;

/// Test context holding the runtime, its fakes, and the event channel.
pub(super) struct TestContext {
    runtime: TestRuntime,
    clock: FakeClock,
    workers: FakeWorkerAdapter,
    remote: FakeRemote,
    pubsub: FakePubSub,
    store: Arc<Mutex<Store>>,
    event_rx: mpsc::Receiver<Event>,
}

pub(super) async fn setup() -> TestContext {
    let dir = tempdir().unwrap();
    let dir_path = dir.keep();

    let workers = FakeWorkerAdapter::new();
    let remote = FakeRemote::new();
    let pubsub = FakePubSub::new();
    let clock = FakeClock::new();
    let store = Arc::new(Mutex::new(Store::open_in_memory().unwrap()));
    let (event_tx, event_rx) = mpsc::channel(100);

    let runtime = Runtime::new(
        RuntimeDeps {
            workers: workers.clone(),
            remote: remote.clone(),
            pubsub: pubsub.clone(),
            store: Arc::clone(&store),
        },
        clock.clone(),
        RuntimeConfig {
            agent_id: "agent-test".into(),
            worker_bin: dir_path.join("milo-worker"),
            worker_args: vec![],
            workspace_dir: dir_path.clone(),
            transcripts_dir: dir_path.join("transcripts"),
            personas_dir: dir_path.join("PERSONAS"),
            skills_dir: dir_path.join("SKILLS"),
            update_script: dir_path.join(".update-daemon.sh"),
            update_log: dir_path.join("update.log"),
            version: "0.0.0-test".into(),
            worker_settings: serde_json::Value::Null,
        },
        event_tx,
    );

    TestContext {
        runtime,
        clock,
        workers,
        remote,
        pubsub,
        store,
        event_rx,
    }
}

impl TestContext {
    /// Process an event plus everything it produces, like the daemon loop.
    pub(super) async fn process(&self, event: Event) {
        let mut pending = vec![event];
        while let Some(event) = pending.pop() {
            let results = self.runtime.handle_event(event).await.unwrap();
            pending.extend(results);
        }
    }

    /// Drain events the fakes pushed onto the bus (worker emits, exits).
    pub(super) async fn drain(&mut self) {
        loop {
            let Ok(event) = self.event_rx.try_recv() else {
                return;
            };
            self.process(event).await;
        }
    }

    /// Route a plain user message.
    pub(super) async fn user_message(&self, message_id: &str, session_id: &str, content: &str) {
        self.process(Event::MessageReceived {
            message: user_message(message_id, session_id, content),
        })
        .await;
    }

    /// Emit a worker message and process it.
    pub(super) async fn worker_emits(&mut self, session_id: &str, msg: WorkerMsg) {
        self.workers.emit(&SessionId::new(session_id), msg).await;
        self.drain().await;
    }

    /// Emit a worker exit and process it.
    pub(super) async fn worker_exits(&mut self, session_id: &str, exit_code: Option<i32>) {
        self.workers
            .emit_exit(&SessionId::new(session_id), exit_code)
            .await;
        self.drain().await;
    }

    /// Advance the clock and run any timers that fired.
    pub(super) async fn advance(&self, delta: Duration) {
        self.clock.advance(delta);
        let fired = {
            let scheduler = self.runtime.scheduler();
            let mut scheduler = scheduler.lock();
            scheduler.fired_timers(self.clock.now())
        };
        for event in fired {
            self.process(event).await;
        }
    }

    /// Spawn a worker for a session and walk it to Idle.
    pub(super) async fn ready_worker(&mut self, session_id: &str) {
        self.user_message(&format!("m-boot-{}", session_id), session_id, "hello")
            .await;
        self.worker_emits(session_id, WorkerMsg::WorkerReady).await;
        let task_id = self.current_task_id(session_id).unwrap();
        self.worker_emits(
            session_id,
            WorkerMsg::WorkerTaskDone {
                task_id,
                summary: Some("booted".into()),
                context_size: None,
            },
        )
        .await;
        assert_eq!(
            self.runtime.actor_state(&SessionId::new(session_id)),
            Some(ActorState::Idle)
        );
    }

    pub(super) fn current_task_id(&self, session_id: &str) -> Option<milo_core::TaskId> {
        self.runtime
            .with_existing_actor(&SessionId::new(session_id), |actor| {
                actor.current_task.as_ref().map(|t| t.task_id.clone())
            })
            .flatten()
    }

    pub(super) fn actor_state(&self, session_id: &str) -> Option<ActorState> {
        self.runtime.actor_state(&SessionId::new(session_id))
    }

    pub(super) fn session_status(&self, session_id: &str) -> Option<SessionStatus> {
        self.store
            .lock()
            .get_session(&SessionId::new(session_id))
            .unwrap()
            .map(|r| r.status)
    }

    /// Messages sent to a session's worker, without the leading init.
    pub(super) fn sent_after_init(&self, session_id: &str) -> Vec<SupervisorMsg> {
        let sent = self.workers.sent(&SessionId::new(session_id));
        sent.into_iter()
            .filter(|m| !matches!(m, SupervisorMsg::WorkerInit { .. }))
            .collect()
    }

    /// All outbox rows, sent or not, in id order.
    pub(super) fn outbox_entries(&self) -> Vec<OutboxEntry> {
        let store = self.store.lock();
        let mut entries = Vec::new();
        for id in 1..200 {
            if let Some(entry) = store.get_outbox_entry(id).unwrap() {
                entries.push(entry);
            }
        }
        entries
    }

    /// Unsent `send_message` payloads currently queued.
    pub(super) fn queued_replies(&self) -> Vec<SendPayload> {
        self.outbox_entries()
            .iter()
            .filter(|e| !e.sent && e.kind() == Some(milo_core::OutboxKind::SendMessage))
            .map(|e| serde_json::from_str(&e.payload).unwrap())
            .collect()
    }

    /// Count of published pub/sub payloads matching a predicate.
    pub(super) fn published_count(&self, pred: impl Fn(&EventPayload) -> bool) -> usize {
        self.pubsub.payloads().iter().filter(|p| pred(p)).count()
    }
}

/// Build a `user_message` envelope with the fields tests care about.
pub(super) fn user_message(message_id: &str, session_id: &str, content: &str) -> Inbound {
    user_message_full(message_id, session_id, content, None, None)
}

pub(super) fn user_message_full(
    message_id: &str,
    session_id: &str,
    content: &str,
    session_name: Option<&str>,
    ui_action: Option<&str>,
) -> Inbound {
    Inbound::UserMessage {
        message_id: MessageId::new(message_id),
        session_id: SessionId::new(session_id),
        session_type: "bot".into(),
        content: content.into(),
        timestamp: "2026-01-01T00:00:00Z".into(),
        session_name: session_name.map(str::to_string),
        ui_action: ui_action.map(str::to_string),
        persona_id: None,
        persona_version_id: None,
        model: None,
    }
}
