// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ingest router: the single entry point for messages arriving over
//! pub/sub or the REST poll.

use crate::actor::ActorState;
use crate::error::RuntimeError;
use crate::runtime::Runtime;
use milo_adapters::{PubSub, RemoteApi, WorkerAdapter};
use milo_core::{
    classify, Clock, Event, EventPayload, FormResponseStatus, IdGen, Inbound, MessageId,
    PersonaRef, SendPayload, SessionId, SessionType, UuidIdGen, WorkItem, WorkItemId,
    WorkItemKind,
};
use milo_storage::{NewInboxEntry, Sender};

/// Everything routing needs about one message, whether it arrived fresh or
/// came back out of the inbox on a redrive.
pub(crate) struct RouteParams {
    pub message_id: MessageId,
    pub session_id: SessionId,
    pub session_type: SessionType,
    pub content: String,
    pub ui_action: Option<String>,
    pub persona: Option<PersonaRef>,
    pub model: Option<String>,
}

impl<W, R, P, C> Runtime<W, R, P, C>
where
    W: WorkerAdapter,
    R: RemoteApi,
    P: PubSub,
    C: Clock,
{
    pub(crate) async fn handle_message_received(
        &self,
        message: Inbound,
    ) -> Result<Vec<Event>, RuntimeError> {
        match message {
            Inbound::UserMessage {
                message_id,
                session_id,
                session_type,
                content,
                session_name,
                ui_action,
                persona_id,
                persona_version_id,
                model,
                timestamp: _,
            } => {
                let session_type = SessionType::parse(&session_type);

                // 1. Deduplicate. A repeated messageId is dropped silently.
                let is_new = self.lock_store(|store| {
                    store.insert_inbox(NewInboxEntry {
                        message_id: &message_id,
                        session_id: &session_id,
                        session_type: session_type.as_str(),
                        content: &content,
                        session_name: session_name.as_deref(),
                        ui_action: ui_action.as_deref(),
                    })
                })?;
                if !is_new {
                    tracing::info!(
                        message_id = %message_id,
                        session_id = %session_id,
                        "duplicate message dropped"
                    );
                    return Ok(vec![]);
                }

                // 2. Fast non-durable receipt signal.
                self.outbound
                    .publish(EventPayload::AgentStatus {
                        content: "Message received. Processing...".into(),
                    })
                    .await;

                // 3. Durable acknowledgement via the outbox.
                self.outbound.enqueue_ack(std::slice::from_ref(&message_id))?;

                // 4. Session record.
                self.lock_store(|store| {
                    store.upsert_session(&session_id, session_name.as_deref(), session_type)
                })?;

                // 5. Audit the user message.
                self.audit(&session_id, Sender::User, &content, Some(&message_id));

                // 6-9. Classify and dispatch.
                let persona = persona_id.zip(persona_version_id).map(
                    |(persona_id, persona_version_id)| PersonaRef {
                        persona_id,
                        persona_version_id,
                    },
                );
                self.route_message(RouteParams {
                    message_id,
                    session_id,
                    session_type,
                    content,
                    ui_action,
                    persona,
                    model,
                })
                .await
            }

            Inbound::FormResponse {
                form_id,
                status,
                values,
            } => self.handle_form_response(&form_id, status, values).await,

            Inbound::UiAction {
                action,
                session_id,
                payload,
            } => self.handle_ui_action(&action, session_id, payload).await,
        }
    }

    /// Steps 6-9 of the router, shared by fresh arrivals and redrives.
    pub(crate) async fn route_message(
        &self,
        params: RouteParams,
    ) -> Result<Vec<Event>, RuntimeError> {
        // Orphan deferral: the row stays unprocessed until the prior-run
        // worker is observed gone.
        if self.is_orphaned(&params.session_id) {
            tracing::info!(
                message_id = %params.message_id,
                session_id = %params.session_id,
                "deferring message for orphaned session"
            );
            return Ok(vec![]);
        }

        let kind = classify(params.ui_action.as_deref(), &params.content);

        if kind.is_inline() {
            match kind {
                WorkItemKind::ListModels => self.reply_models(&params).await?,
                _ => self.reply_status(&params).await?,
            }
            self.lock_store(|store| store.mark_processed(&params.message_id))?;
            return Ok(vec![]);
        }

        let events = self.dispatch_work(&params, kind).await?;
        self.lock_store(|store| store.mark_processed(&params.message_id))?;
        Ok(events)
    }

    /// Route a classified work item through the actor state machine.
    async fn dispatch_work(
        &self,
        params: &RouteParams,
        kind: WorkItemKind,
    ) -> Result<Vec<Event>, RuntimeError> {
        let item = WorkItem {
            id: WorkItemId::new(UuidIdGen.next()),
            kind,
            message_id: params.message_id.clone(),
            content: params.content.clone(),
            persona: params.persona.clone(),
            model: params.model.clone(),
        };
        let session_id = &params.session_id;

        self.hydrate_actor(session_id, params.session_type)?;

        // Decide under the actor lock, act after releasing it.
        let action = self.with_existing_actor(session_id, |actor| {
            decide(actor.state, &item, actor.pending_question.clone())
        });
        let Some(action) = action else {
            return Ok(vec![]);
        };

        match action {
            RouteAction::Queue => {
                self.with_existing_actor(session_id, |actor| actor.push(item));
                Ok(vec![])
            }
            RouteAction::QueueAndSpawn => {
                self.with_existing_actor(session_id, |actor| actor.push(item));
                self.spawn_worker(session_id, params.session_type).await
            }
            RouteAction::StartTask => self.start_task(session_id, item).await,
            RouteAction::Steer => self.steer(session_id, &item).await,
            RouteAction::Answer { tool_call_id } => {
                self.answer(session_id, &tool_call_id, &item).await
            }
            RouteAction::BeginCancel => self.begin_cancel(session_id).await,
            RouteAction::NothingToCancel => {
                self.outbound
                    .publish(EventPayload::AgentStatus {
                        content: "No task is running.".into(),
                    })
                    .await;
                Ok(vec![])
            }
            RouteAction::Close => self.close_actor(session_id).await,
            RouteAction::Ignore => Ok(vec![]),
        }
    }

    /// Make sure an actor record exists, loading the confirmed project from
    /// the sessions table on first touch.
    fn hydrate_actor(
        &self,
        session_id: &SessionId,
        session_type: SessionType,
    ) -> Result<(), RuntimeError> {
        let exists = self.with_existing_actor(session_id, |_| ()).is_some();
        if exists {
            return Ok(());
        }
        let record = self.lock_store(|store| store.get_session(session_id))?;
        self.with_actor(session_id, session_type, |actor| {
            if let Some(record) = record {
                actor.project_path = record.project_path;
                actor.pending_question = record.pending_tool_call;
                actor.pending_form = record.pending_form;
            }
        });
        Ok(())
    }

    /// Inline reply: the curated model catalog.
    async fn reply_models(&self, params: &RouteParams) -> Result<(), RuntimeError> {
        self.outbound
            .publish(EventPayload::ModelsList {
                models: self.models.models().to_vec(),
            })
            .await;

        let content = self.models.as_text();
        self.outbound.enqueue_send(&SendPayload {
            session_id: params.session_id.clone(),
            content: content.clone(),
            form_data: None,
            file_data: None,
        })?;
        self.audit(&params.session_id, Sender::Agent, &content, None);
        Ok(())
    }

    /// Inline reply: session status summary.
    async fn reply_status(&self, params: &RouteParams) -> Result<(), RuntimeError> {
        let record = self.lock_store(|store| store.get_session(&params.session_id))?;
        let (state, queued) = {
            let actors = self.actors.lock();
            match actors.get(&params.session_id) {
                Some(actor) => (Some(actor.state), actor.queued()),
                None => (None, 0),
            }
        };

        let status = record
            .map(|r| r.status.as_str())
            .unwrap_or("OPEN_IDLE");
        let worker = match state {
            Some(ActorState::Spawning) => "starting",
            Some(ActorState::Idle) => "ready",
            Some(
                ActorState::Running
                | ActorState::Cancelling
                | ActorState::WaitingUser
                | ActorState::Dying,
            ) => "busy",
            Some(ActorState::Dead) | None => "none",
        };
        let content = format!(
            "Session {}: {}. Worker: {}. Queued messages: {}.",
            params.session_id, status, worker, queued
        );

        self.outbound
            .publish(EventPayload::AgentStatus {
                content: content.clone(),
            })
            .await;
        self.outbound.enqueue_send(&SendPayload {
            session_id: params.session_id.clone(),
            content: content.clone(),
            form_data: None,
            file_data: None,
        })?;
        self.audit(&params.session_id, Sender::Agent, &content, None);
        Ok(())
    }

    /// Route a form response to the session waiting on it.
    async fn handle_form_response(
        &self,
        form_id: &str,
        status: FormResponseStatus,
        values: Option<serde_json::Value>,
    ) -> Result<Vec<Event>, RuntimeError> {
        // In-memory actors first, then the persisted mapping.
        let session_id = {
            let actors = self.actors.lock();
            actors
                .values()
                .find(|a| a.pending_form.as_deref() == Some(form_id))
                .map(|a| a.session_id.clone())
        };
        let session_id = match session_id {
            Some(sid) => Some(sid),
            None => self
                .lock_store(|store| store.find_session_by_pending_form(form_id))?
                .map(|r| r.session_id),
        };

        let Some(session_id) = session_id else {
            tracing::warn!(form_id, "form response for unknown form");
            self.outbound
                .publish(EventPayload::Error {
                    message: format!("Form response ignored: unknown form {}", form_id),
                })
                .await;
            return Ok(vec![]);
        };

        let live = self
            .with_existing_actor(&session_id, |actor| {
                actor.state == ActorState::WaitingUser
                    && actor.pending_form.as_deref() == Some(form_id)
                    && actor.has_live_worker()
            })
            .unwrap_or(false);

        if !live {
            // Restart (or crash) lost the worker that asked. Drop with an
            // explicit notice rather than replaying into a fresh worker.
            self.lock_store(|store| store.set_pending_form(&session_id, None))?;
            self.outbound
                .send_reply(SendPayload {
                    session_id: session_id.clone(),
                    content: "That form has expired. Please ask again.".into(),
                    form_data: None,
                    file_data: None,
                })
                .await?;
            return Ok(vec![]);
        }

        let ipc_status = match status {
            FormResponseStatus::Submitted => milo_core::ipc::FormStatus::Submitted,
            FormResponseStatus::Cancelled => milo_core::ipc::FormStatus::Cancelled,
        };
        self.workers
            .send(
                &session_id,
                &milo_core::SupervisorMsg::WorkerFormResponse {
                    form_id: form_id.to_string(),
                    status: ipc_status,
                    values,
                },
            )
            .await?;

        self.with_existing_actor(&session_id, |actor| {
            actor.pending_form = None;
            actor.state = ActorState::Running;
        });
        self.lock_store(|store| store.set_pending_form(&session_id, None))?;
        self.audit(
            &session_id,
            Sender::User,
            &format!("form {}: {:?}", form_id, status),
            None,
        );
        self.set_session_status(&session_id, milo_core::SessionStatus::OpenRunning)
            .await;
        Ok(vec![])
    }
}

/// What to do with a routed item, decided from actor state and item kind.
enum RouteAction {
    Queue,
    QueueAndSpawn,
    StartTask,
    Steer,
    Answer { tool_call_id: String },
    BeginCancel,
    NothingToCancel,
    Close,
    Ignore,
}

fn decide(
    state: ActorState,
    item: &WorkItem,
    pending_question: Option<String>,
) -> RouteAction {
    match item.kind {
        WorkItemKind::UserMessage => match state {
            ActorState::Dead => RouteAction::QueueAndSpawn,
            ActorState::Idle => RouteAction::StartTask,
            // Mid-task input influences the running turn instead of queueing.
            ActorState::Running => RouteAction::Steer,
            ActorState::WaitingUser => match pending_question {
                Some(tool_call_id) => RouteAction::Answer { tool_call_id },
                None => RouteAction::Steer,
            },
            ActorState::Spawning | ActorState::Cancelling | ActorState::Dying => {
                RouteAction::Queue
            }
        },
        WorkItemKind::Cancel => match state {
            ActorState::Running | ActorState::WaitingUser => RouteAction::BeginCancel,
            ActorState::Spawning => RouteAction::Queue,
            ActorState::Idle | ActorState::Dead => RouteAction::NothingToCancel,
            ActorState::Cancelling | ActorState::Dying => RouteAction::Ignore,
        },
        WorkItemKind::CloseSession => match state {
            ActorState::Dying => RouteAction::Ignore,
            _ => RouteAction::Close,
        },
        // Inline kinds never reach the queue.
        WorkItemKind::StatusRequest | WorkItemKind::ListModels => RouteAction::Ignore,
    }
}
