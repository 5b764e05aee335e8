// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker lifecycle and IPC handling: spawn, dispatch, steering, the
//! cancellation ladder, and crash recovery.

use crate::actor::{ActorState, CurrentTask};
use crate::error::RuntimeError;
use crate::runtime::Runtime;
use milo_adapters::{PubSub, RemoteApi, WorkerAdapter, WorkerSpawnConfig};
use milo_core::{
    Clock, Event, EventPayload, IdGen, SendPayload, SessionId, SessionSpec, SessionType,
    SupervisorMsg, TaskId, TimerId, UuidIdGen, WorkItem, WorkItemKind, WorkerMsg, WorkerState,
};
use milo_storage::Sender;

impl<W, R, P, C> Runtime<W, R, P, C>
where
    W: WorkerAdapter,
    R: RemoteApi,
    P: PubSub,
    C: Clock,
{
    /// Spawn a worker for a session. The actor must already exist.
    pub(crate) async fn spawn_worker(
        &self,
        session_id: &SessionId,
        session_type: SessionType,
    ) -> Result<Vec<Event>, RuntimeError> {
        let record = self.lock_store(|store| store.get_session(session_id))?;
        let session_name = record.as_ref().and_then(|r| r.name.clone());
        let project_path = self
            .with_existing_actor(session_id, |actor| actor.project_path.clone())
            .flatten()
            .or_else(|| record.and_then(|r| r.project_path));

        // A fresh worker has no memory; give it the recent conversation.
        let history = match self
            .remote
            .history(session_id, crate::env::history_limit())
            .await
        {
            Ok(history) => history,
            Err(e) => {
                tracing::debug!(session_id = %session_id, error = %e, "history fetch failed");
                vec![]
            }
        };

        let init = SupervisorMsg::WorkerInit {
            session_id: session_id.clone(),
            session_name,
            spec: SessionSpec::new(session_type),
            project_path,
            workspace_path: self.config.workspace_dir.clone(),
            history,
            settings: self.config.worker_settings.clone(),
        };
        let config = WorkerSpawnConfig {
            session_id: session_id.clone(),
            worker_bin: self.config.worker_bin.clone(),
            args: self.config.worker_args.clone(),
            cwd: self.config.workspace_dir.clone(),
            env: vec![],
            init,
        };

        match self.workers.spawn(config, self.event_tx.clone()).await {
            Ok(handle) => {
                self.with_existing_actor(session_id, |actor| {
                    actor.worker_pid = Some(handle.pid);
                    actor.state = ActorState::Spawning;
                });
                self.lock_store(|store| {
                    store.update_worker_state(
                        session_id,
                        Some(WorkerState::Starting),
                        Some(handle.pid),
                    )
                })?;
                self.set_timer(
                    TimerId::spawn_timeout(session_id),
                    crate::env::spawn_timeout(),
                );
                Ok(vec![])
            }
            Err(e) => Ok(vec![Event::WorkerSpawnFailed {
                session_id: session_id.clone(),
                error: e.to_string(),
            }]),
        }
    }

    /// Dispatch a user message as the actor's one running task.
    pub(crate) async fn start_task(
        &self,
        session_id: &SessionId,
        item: WorkItem,
    ) -> Result<Vec<Event>, RuntimeError> {
        let task_id = TaskId::new(UuidIdGen.next());
        let spec = self.task_spec(session_id, &item);

        let msg = SupervisorMsg::WorkerTask {
            task_id: task_id.clone(),
            content: item.content.clone(),
            spec,
        };
        if let Err(e) = self.workers.send(session_id, &msg).await {
            // The worker broke between ready and dispatch; the item goes
            // back to the front so the respawn picks it up.
            self.with_existing_actor(session_id, |actor| actor.push_front(item));
            return Ok(vec![Event::WorkerSendFailed {
                session_id: session_id.clone(),
                task_id: Some(task_id),
                error: e.to_string(),
            }]);
        }

        let now = self.clock.now();
        let pid = self
            .with_existing_actor(session_id, |actor| {
                actor.current_task = Some(CurrentTask {
                    task_id,
                    message_id: item.message_id.clone(),
                    started_at: now,
                    cancel_requested_at: None,
                });
                actor.state = ActorState::Running;
                actor.worker_pid
            })
            .flatten();
        self.lock_store(|store| {
            store.update_worker_state(session_id, Some(WorkerState::Busy), pid)?;
            // A fresh task invalidates any question/form left by a prior
            // worker generation.
            store.set_pending_tool_call(session_id, None)?;
            store.set_pending_form(session_id, None)
        })?;
        self.set_session_status(session_id, milo_core::SessionStatus::OpenRunning)
            .await;
        Ok(vec![])
    }

    /// Per-task session spec: type plus any persona/model override.
    fn task_spec(&self, session_id: &SessionId, item: &WorkItem) -> SessionSpec {
        let session_type = self
            .with_existing_actor(session_id, |actor| actor.session_type)
            .unwrap_or(SessionType::Bot);
        let mut spec = SessionSpec::new(session_type);

        if let Some(ref persona) = item.persona {
            if self.personas.load(persona).is_none() {
                tracing::warn!(
                    session_id = %session_id,
                    persona_id = %persona.persona_id,
                    "persona not cached; worker will run without it"
                );
            }
            spec.persona = Some(persona.clone());
        }
        if let Some(ref model) = item.model {
            if !self.models.contains(model) {
                tracing::warn!(session_id = %session_id, model, "model override not in catalog");
            }
            spec.model = Some(model.clone());
        }
        spec
    }

    /// Forward a mid-task user message into the running turn.
    pub(crate) async fn steer(
        &self,
        session_id: &SessionId,
        item: &WorkItem,
    ) -> Result<Vec<Event>, RuntimeError> {
        let task_id = self
            .with_existing_actor(session_id, |actor| {
                actor.current_task.as_ref().map(|t| t.task_id.clone())
            })
            .flatten();
        let Some(task_id) = task_id else {
            // No task to steer; treat as a fresh message next time around.
            tracing::warn!(session_id = %session_id, "steer with no current task, queueing");
            self.with_existing_actor(session_id, |actor| actor.push(item.clone()));
            return Ok(vec![]);
        };

        if let Err(e) = self
            .workers
            .send(
                session_id,
                &SupervisorMsg::WorkerSteer {
                    task_id: task_id.clone(),
                    content: item.content.clone(),
                },
            )
            .await
        {
            return Ok(vec![Event::WorkerSendFailed {
                session_id: session_id.clone(),
                task_id: Some(task_id),
                error: e.to_string(),
            }]);
        }
        Ok(vec![])
    }

    /// Answer the outstanding question with the user's message.
    pub(crate) async fn answer(
        &self,
        session_id: &SessionId,
        tool_call_id: &str,
        item: &WorkItem,
    ) -> Result<Vec<Event>, RuntimeError> {
        if let Err(e) = self
            .workers
            .send(
                session_id,
                &SupervisorMsg::WorkerAnswer {
                    tool_call_id: tool_call_id.to_string(),
                    answer: item.content.clone(),
                },
            )
            .await
        {
            return Ok(vec![Event::WorkerSendFailed {
                session_id: session_id.clone(),
                task_id: None,
                error: e.to_string(),
            }]);
        }

        self.with_existing_actor(session_id, |actor| {
            actor.pending_question = None;
            actor.state = ActorState::Running;
        });
        self.lock_store(|store| store.set_pending_tool_call(session_id, None))?;
        self.set_session_status(session_id, milo_core::SessionStatus::OpenRunning)
            .await;
        Ok(vec![])
    }

    /// Start the cancellation ladder for the running task.
    pub(crate) async fn begin_cancel(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Event>, RuntimeError> {
        let task_id = self
            .with_existing_actor(session_id, |actor| {
                actor.current_task.as_ref().map(|t| t.task_id.clone())
            })
            .flatten();
        let Some(task_id) = task_id else {
            return Ok(vec![]);
        };

        if let Err(e) = self
            .workers
            .send(session_id, &SupervisorMsg::WorkerCancel { task_id })
            .await
        {
            tracing::warn!(session_id = %session_id, error = %e, "cancel send failed, escalating");
        }

        let now = self.clock.now();
        self.with_existing_actor(session_id, |actor| {
            actor.state = ActorState::Cancelling;
            if let Some(ref mut task) = actor.current_task {
                task.cancel_requested_at = Some(now);
            }
        });
        self.set_timer(
            TimerId::cancel_term(session_id),
            crate::env::cancel_term_delay(),
        );
        self.audit(session_id, Sender::System, "cancel requested", None);
        Ok(vec![])
    }

    /// Request a graceful close, with the kill timer armed.
    pub(crate) async fn close_actor(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Event>, RuntimeError> {
        let live = self
            .with_existing_actor(session_id, |actor| actor.has_live_worker())
            .unwrap_or(false);

        if !live {
            return self.finalize_close(session_id).await;
        }

        if let Err(e) = self
            .workers
            .send(session_id, &SupervisorMsg::WorkerClose)
            .await
        {
            tracing::warn!(session_id = %session_id, error = %e, "close send failed, killing");
            let _ = self.workers.kill(session_id).await;
        }
        self.with_existing_actor(session_id, |actor| actor.state = ActorState::Dying);
        self.set_timer(TimerId::close_grace(session_id), crate::env::close_grace());
        self.audit(session_id, Sender::System, "close requested", None);
        Ok(vec![])
    }

    /// Finish a close once the worker is gone (or never existed).
    pub(crate) async fn finalize_close(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Event>, RuntimeError> {
        self.cancel_session_timers(session_id);

        let dropped = {
            let mut actors = self.actors.lock();
            actors.remove(session_id).map(|mut a| a.drain_all())
        };
        if let Some(dropped) = dropped {
            if dropped > 0 {
                tracing::warn!(session_id = %session_id, dropped, "dropping queued items on close");
            }
        }

        self.lock_store(|store| {
            store.update_worker_state(session_id, None, None)?;
            store.set_pending_tool_call(session_id, None)?;
            store.set_pending_form(session_id, None)
        })?;
        self.audit(session_id, Sender::System, "session closed", None);
        self.set_session_status(session_id, milo_core::SessionStatus::Closed)
            .await;
        Ok(vec![])
    }

    /// Pull the next queued item once the worker is free. Control items are
    /// settled inline; the first user message becomes the task.
    pub(crate) async fn dispatch_next(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Event>, RuntimeError> {
        loop {
            let item = self
                .with_existing_actor(session_id, |actor| actor.pop_next())
                .flatten();

            let Some(item) = item else {
                let pid = self
                    .with_existing_actor(session_id, |actor| {
                        actor.state = ActorState::Idle;
                        actor.worker_pid
                    })
                    .flatten();
                self.lock_store(|store| {
                    store.update_worker_state(session_id, Some(WorkerState::Ready), pid)
                })?;
                self.set_session_status(session_id, milo_core::SessionStatus::OpenIdle)
                    .await;
                return Ok(vec![]);
            };

            match item.kind {
                WorkItemKind::UserMessage => return self.start_task(session_id, item).await,
                WorkItemKind::Cancel => {
                    // The task it targeted is already gone.
                    self.outbound
                        .publish(EventPayload::AgentStatus {
                            content: "No task is running.".into(),
                        })
                        .await;
                }
                WorkItemKind::CloseSession => return self.close_actor(session_id).await,
                WorkItemKind::StatusRequest | WorkItemKind::ListModels => {
                    tracing::warn!(session_id = %session_id, "inline item found in queue, dropping");
                }
            }
        }
    }

    /// Respawn when a dead actor still has queued work.
    async fn respawn_if_queued(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Event>, RuntimeError> {
        let pending = self
            .with_existing_actor(session_id, |actor| {
                (actor.has_queued(), actor.session_type)
            });
        match pending {
            Some((true, session_type)) => self.spawn_worker(session_id, session_type).await,
            _ => Ok(vec![]),
        }
    }

    /// One message read from a worker's stdout.
    pub(crate) async fn handle_worker_msg(
        &self,
        session_id: &SessionId,
        msg: WorkerMsg,
    ) -> Result<Vec<Event>, RuntimeError> {
        if self.with_existing_actor(session_id, |_| ()).is_none() {
            tracing::warn!(session_id = %session_id, "worker message for unknown session, dropping");
            return Ok(vec![]);
        }

        match msg {
            WorkerMsg::WorkerReady => {
                self.cancel_timer(&TimerId::spawn_timeout(session_id));
                tracing::info!(session_id = %session_id, "worker ready");
                self.dispatch_next(session_id).await
            }

            WorkerMsg::WorkerTaskStarted { task_id } => {
                tracing::debug!(session_id = %session_id, task_id = %task_id, "task started");
                Ok(vec![])
            }

            WorkerMsg::WorkerTaskDone {
                task_id,
                summary,
                context_size,
            } => {
                if !self.task_matches(session_id, &task_id) {
                    tracing::warn!(session_id = %session_id, task_id = %task_id, "stale task done, ignoring");
                    return Ok(vec![]);
                }
                self.cancel_session_timers(session_id);
                self.clear_task_state(session_id)?;

                let content = summary.unwrap_or_else(|| "Done.".to_string());
                self.audit(session_id, Sender::Agent, &content, None);
                self.outbound.enqueue_send(&SendPayload {
                    session_id: session_id.clone(),
                    content: content.clone(),
                    form_data: None,
                    file_data: None,
                })?;
                self.outbound
                    .publish(EventPayload::AgentMessage {
                        session_id: session_id.clone(),
                        content,
                        context_size,
                    })
                    .await;

                self.dispatch_next(session_id).await
            }

            WorkerMsg::WorkerTaskCancelled { task_id } => {
                if !self.task_matches(session_id, &task_id) {
                    tracing::warn!(session_id = %session_id, task_id = %task_id, "stale cancel ack, ignoring");
                    return Ok(vec![]);
                }
                self.cancel_session_timers(session_id);
                self.clear_task_state(session_id)?;
                self.announce_cancelled(session_id).await?;
                self.dispatch_next(session_id).await
            }

            WorkerMsg::WorkerError { message, fatal } => {
                self.handle_worker_error(session_id, &message, fatal).await
            }

            WorkerMsg::WorkerProgress { status } => {
                self.outbound
                    .publish(EventPayload::AgentStatus { content: status })
                    .await;
                Ok(vec![])
            }

            WorkerMsg::WorkerStreamText { text } => {
                // Streaming fragments ride pub/sub only; the durable reply
                // is the single outbox row written at task completion.
                self.outbound
                    .publish(EventPayload::AgentMessage {
                        session_id: session_id.clone(),
                        content: text,
                        context_size: None,
                    })
                    .await;
                Ok(vec![])
            }

            WorkerMsg::WorkerToolStart {
                tool_call_id: _,
                tool,
                detail,
            } => {
                self.outbound
                    .publish(EventPayload::ToolUse {
                        session_id: session_id.clone(),
                        tool,
                        phase: "start".into(),
                        ok: None,
                        detail,
                    })
                    .await;
                Ok(vec![])
            }

            WorkerMsg::WorkerToolEnd {
                tool_call_id: _,
                tool,
                ok,
                detail,
            } => {
                if !ok {
                    self.audit(
                        session_id,
                        Sender::System,
                        &format!(
                            "tool {} failed: {}",
                            tool,
                            detail.as_deref().unwrap_or("no detail")
                        ),
                        None,
                    );
                }
                self.outbound
                    .publish(EventPayload::ToolUse {
                        session_id: session_id.clone(),
                        tool,
                        phase: "end".into(),
                        ok: Some(ok),
                        detail,
                    })
                    .await;
                Ok(vec![])
            }

            WorkerMsg::WorkerQuestion {
                tool_call_id,
                question,
            } => {
                let running = self
                    .with_existing_actor(session_id, |actor| {
                        actor.state == ActorState::Running
                    })
                    .unwrap_or(false);
                if !running {
                    tracing::warn!(session_id = %session_id, "question outside a running task, ignoring");
                    return Ok(vec![]);
                }

                self.with_existing_actor(session_id, |actor| {
                    actor.pending_question = Some(tool_call_id.clone());
                    actor.state = ActorState::WaitingUser;
                });
                self.lock_store(|store| {
                    store.set_pending_tool_call(session_id, Some(&tool_call_id))
                })?;
                self.audit(session_id, Sender::Agent, &question, None);
                self.outbound
                    .send_reply(SendPayload {
                        session_id: session_id.clone(),
                        content: question,
                        form_data: None,
                        file_data: None,
                    })
                    .await?;
                self.set_session_status(session_id, milo_core::SessionStatus::OpenWaitingUser)
                    .await;
                Ok(vec![])
            }

            WorkerMsg::WorkerFormRequest { form_id, form } => {
                let running = self
                    .with_existing_actor(session_id, |actor| {
                        actor.state == ActorState::Running
                    })
                    .unwrap_or(false);
                if !running {
                    tracing::warn!(session_id = %session_id, "form request outside a running task, ignoring");
                    return Ok(vec![]);
                }

                self.with_existing_actor(session_id, |actor| {
                    actor.pending_form = Some(form_id.clone());
                    actor.state = ActorState::WaitingUser;
                });
                self.lock_store(|store| store.set_pending_form(session_id, Some(&form_id)))?;
                self.audit(
                    session_id,
                    Sender::Agent,
                    &format!("form requested ({})", form_id),
                    None,
                );
                self.outbound
                    .publish(EventPayload::FormRequest {
                        session_id: session_id.clone(),
                        form_id: form_id.clone(),
                        form: form.clone(),
                    })
                    .await;
                self.outbound.enqueue_send(&SendPayload {
                    session_id: session_id.clone(),
                    content: "Input required.".into(),
                    form_data: Some(form),
                    file_data: None,
                })?;
                self.set_session_status(
                    session_id,
                    milo_core::SessionStatus::OpenInputRequired,
                )
                .await;
                Ok(vec![])
            }

            WorkerMsg::WorkerFileSend {
                file_name,
                file_contents,
                mime_type,
            } => {
                self.outbound
                    .publish(EventPayload::FileSend {
                        session_id: session_id.clone(),
                        file_name: file_name.clone(),
                        file_contents: file_contents.clone(),
                        mime_type: mime_type.clone(),
                    })
                    .await;
                self.outbound.enqueue_send(&SendPayload {
                    session_id: session_id.clone(),
                    content: file_name.clone(),
                    form_data: None,
                    file_data: Some(serde_json::json!({
                        "fileName": file_name,
                        "fileContents": file_contents,
                        "mimeType": mime_type,
                    })),
                })?;
                Ok(vec![])
            }

            WorkerMsg::WorkerProjectSet { project_path } => {
                self.with_existing_actor(session_id, |actor| {
                    actor.project_path = Some(project_path.clone())
                });
                self.lock_store(|store| {
                    store.update_confirmed_project(session_id, &project_path)
                })?;
                let status = self
                    .with_existing_actor(session_id, |actor| actor.derived_status())
                    .unwrap_or(milo_core::SessionStatus::OpenIdle);
                self.outbound
                    .publish(EventPayload::SessionUpdate {
                        session_id: session_id.clone(),
                        session_status: status,
                    })
                    .await;
                Ok(vec![])
            }
        }
    }

    /// A finished task leaves no pending question/form behind.
    fn clear_task_state(&self, session_id: &SessionId) -> Result<(), RuntimeError> {
        let had_pending = self
            .with_existing_actor(session_id, |actor| {
                actor.current_task = None;
                let had = actor.pending_question.is_some() || actor.pending_form.is_some();
                actor.pending_question = None;
                actor.pending_form = None;
                had
            })
            .unwrap_or(false);
        if had_pending {
            self.lock_store(|store| {
                store.set_pending_tool_call(session_id, None)?;
                store.set_pending_form(session_id, None)
            })?;
        }
        Ok(())
    }

    fn task_matches(&self, session_id: &SessionId, task_id: &TaskId) -> bool {
        self.with_existing_actor(session_id, |actor| {
            actor
                .current_task
                .as_ref()
                .is_some_and(|t| t.task_id == *task_id)
        })
        .unwrap_or(false)
    }

    /// The one user-visible cancel confirmation (P9).
    async fn announce_cancelled(&self, session_id: &SessionId) -> Result<(), RuntimeError> {
        self.audit(session_id, Sender::System, "task cancelled", None);
        self.outbound.enqueue_send(&SendPayload {
            session_id: session_id.clone(),
            content: "Task cancelled.".into(),
            form_data: None,
            file_data: None,
        })?;
        self.outbound
            .publish(EventPayload::AgentStatus {
                content: "Task cancelled.".into(),
            })
            .await;
        Ok(())
    }

    /// A fatal worker error fails the task and puts the worker down; the
    /// exit event finishes the bookkeeping.
    async fn handle_worker_error(
        &self,
        session_id: &SessionId,
        message: &str,
        fatal: bool,
    ) -> Result<Vec<Event>, RuntimeError> {
        self.audit(
            session_id,
            Sender::System,
            &format!("worker error (fatal={}): {}", fatal, message),
            None,
        );
        self.outbound
            .publish(EventPayload::Error {
                message: message.to_string(),
            })
            .await;

        if !fatal {
            return Ok(vec![]);
        }

        let had_task = self
            .with_existing_actor(session_id, |actor| {
                let had = actor.current_task.take().is_some();
                actor.state = ActorState::Dead;
                had
            })
            .unwrap_or(false);
        if had_task {
            self.outbound.enqueue_send(&SendPayload {
                session_id: session_id.clone(),
                content: "The agent hit a fatal error. Send a new message to retry.".into(),
                form_data: None,
                file_data: None,
            })?;
        }
        // Make sure the process actually goes down; the exit event drives
        // the rest.
        let _ = self.workers.kill(session_id).await;
        Ok(vec![])
    }

    /// The child process exited, for any reason.
    pub(crate) async fn handle_worker_exited(
        &self,
        session_id: &SessionId,
        exit_code: Option<i32>,
    ) -> Result<Vec<Event>, RuntimeError> {
        let snapshot = self.with_existing_actor(session_id, |actor| {
            (actor.state, actor.current_task.clone())
        });
        let Some((state, current_task)) = snapshot else {
            tracing::debug!(session_id = %session_id, "exit for unknown session");
            return Ok(vec![]);
        };

        self.cancel_session_timers(session_id);
        tracing::info!(session_id = %session_id, ?exit_code, ?state, "worker exited");

        if state == ActorState::Dying {
            return self.finalize_close(session_id).await;
        }

        let dropped_high = self.with_existing_actor(session_id, |actor| {
            actor.worker_pid = None;
            actor.current_task = None;
            actor.pending_question = None;
            actor.pending_form = None;
            let was_dead = actor.state == ActorState::Dead;
            actor.state = ActorState::Dead;
            // Queued cancel/close are moot once the worker is gone.
            (actor.drain_high(), was_dead)
        });
        let (dropped_high, was_already_dead) = dropped_high.unwrap_or((0, false));
        if dropped_high > 0 {
            tracing::info!(session_id = %session_id, dropped_high, "dropped moot control items");
        }

        // The persisted pending question/form stays: it is how a response
        // that arrives after this death finds its session and gets the
        // "expired" notice instead of vanishing.
        self.lock_store(|store| {
            store.update_worker_state(session_id, Some(WorkerState::Dead), None)
        })?;

        match state {
            ActorState::Cancelling => {
                // The ladder ended in termination; still exactly one
                // user-visible cancel confirmation.
                self.announce_cancelled(session_id).await?;
                self.set_session_status(session_id, milo_core::SessionStatus::OpenIdle)
                    .await;
                self.respawn_if_queued(session_id).await
            }
            ActorState::Spawning => {
                // Died before ready. No auto-respawn: a broken worker
                // binary would loop.
                self.audit(
                    session_id,
                    Sender::System,
                    &format!("worker exited during startup (code {:?})", exit_code),
                    None,
                );
                self.outbound
                    .publish(EventPayload::Error {
                        message: "Worker exited during startup.".into(),
                    })
                    .await;
                self.set_session_status(session_id, milo_core::SessionStatus::OpenIdle)
                    .await;
                Ok(vec![])
            }
            _ if current_task.is_some() => {
                // Unexpected death mid-task: synthetic fatal error.
                let detail = format!("worker exited unexpectedly (code {:?})", exit_code);
                self.audit(session_id, Sender::System, &detail, None);
                self.outbound
                    .publish(EventPayload::Error {
                        message: detail,
                    })
                    .await;
                self.outbound.enqueue_send(&SendPayload {
                    session_id: session_id.clone(),
                    content: "The agent crashed while working on your request. Send a new message to retry."
                        .into(),
                    form_data: None,
                    file_data: None,
                })?;
                self.set_session_status(session_id, milo_core::SessionStatus::OpenIdle)
                    .await;
                self.respawn_if_queued(session_id).await
            }
            _ => {
                if !was_already_dead {
                    self.set_session_status(session_id, milo_core::SessionStatus::OpenIdle)
                        .await;
                }
                self.respawn_if_queued(session_id).await
            }
        }
    }

    /// The spawn call itself failed.
    pub(crate) async fn handle_worker_spawn_failed(
        &self,
        session_id: &SessionId,
        error: &str,
    ) -> Result<Vec<Event>, RuntimeError> {
        self.with_existing_actor(session_id, |actor| {
            actor.worker_pid = None;
            actor.state = ActorState::Dead;
        });
        self.lock_store(|store| {
            store.update_worker_state(session_id, Some(WorkerState::Dead), None)
        })?;
        self.audit(
            session_id,
            Sender::System,
            &format!("worker spawn failed: {}", error),
            None,
        );
        self.outbound
            .publish(EventPayload::Error {
                message: format!("Failed to start the agent: {}", error),
            })
            .await;
        self.outbound.enqueue_send(&SendPayload {
            session_id: session_id.clone(),
            content: "Failed to start the agent. Send a new message to retry.".into(),
            form_data: None,
            file_data: None,
        })?;
        Ok(vec![])
    }

    /// A write to the worker's stdin failed after dispatch decisions were
    /// made. Kill it; the exit event reconciles state and respawns.
    pub(crate) async fn handle_worker_send_failed(
        &self,
        session_id: &SessionId,
        task_id: Option<TaskId>,
        error: &str,
    ) -> Result<Vec<Event>, RuntimeError> {
        tracing::warn!(session_id = %session_id, ?task_id, error, "worker send failed, killing worker");
        self.with_existing_actor(session_id, |actor| {
            if let (Some(task_id), Some(task)) = (task_id.as_ref(), actor.current_task.as_ref())
            {
                if task.task_id == *task_id {
                    actor.current_task = None;
                }
            }
        });
        let _ = self.workers.kill(session_id).await;
        Ok(vec![])
    }
}
