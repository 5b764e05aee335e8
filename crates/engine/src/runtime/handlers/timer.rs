// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fired-timer handling: the escalation ladders.

use crate::actor::ActorState;
use crate::error::RuntimeError;
use crate::runtime::Runtime;
use milo_adapters::{PubSub, RemoteApi, WorkerAdapter};
use milo_core::{Clock, Event, EventPayload, TimerId};
use milo_storage::Sender;

impl<W, R, P, C> Runtime<W, R, P, C>
where
    W: WorkerAdapter,
    R: RemoteApi,
    P: PubSub,
    C: Clock,
{
    pub(crate) async fn handle_timer_fired(
        &self,
        id: &TimerId,
    ) -> Result<Vec<Event>, RuntimeError> {
        let Some(session_id) = id.session_id() else {
            tracing::debug!(timer = %id, "timer with no session, ignoring");
            return Ok(vec![]);
        };

        let state = self.with_existing_actor(&session_id, |actor| actor.state);

        if id.is_cancel_term() {
            // Step 1 of the ladder: the cancel went unacknowledged.
            if state == Some(ActorState::Cancelling) {
                self.audit(
                    &session_id,
                    Sender::System,
                    "cancel unacknowledged, sending SIGTERM",
                    None,
                );
                if let Err(e) = self.workers.terminate(&session_id).await {
                    tracing::warn!(session_id = %session_id, error = %e, "SIGTERM failed");
                }
                self.set_timer(
                    TimerId::cancel_kill(&session_id),
                    crate::env::cancel_kill_delay(),
                );
            }
        } else if id.is_cancel_kill() {
            // Step 2: it survived the SIGTERM.
            if state == Some(ActorState::Cancelling) {
                self.audit(
                    &session_id,
                    Sender::System,
                    "worker survived SIGTERM, sending SIGKILL",
                    None,
                );
                if let Err(e) = self.workers.kill(&session_id).await {
                    tracing::warn!(session_id = %session_id, error = %e, "SIGKILL failed");
                }
            }
        } else if id.is_close_grace() {
            if state == Some(ActorState::Dying) {
                tracing::warn!(session_id = %session_id, "close grace expired, killing worker");
                if let Err(e) = self.workers.kill(&session_id).await {
                    tracing::warn!(session_id = %session_id, error = %e, "SIGKILL failed");
                }
            }
        } else if id.is_spawn_timeout() {
            if state == Some(ActorState::Spawning) {
                self.audit(
                    &session_id,
                    Sender::System,
                    "worker missed the ready deadline, killing",
                    None,
                );
                self.outbound
                    .publish(EventPayload::Error {
                        message: "Worker failed to start in time.".into(),
                    })
                    .await;
                if let Err(e) = self.workers.kill(&session_id).await {
                    tracing::warn!(session_id = %session_id, error = %e, "SIGKILL failed");
                }
            }
        } else {
            tracing::debug!(timer = %id, "unknown timer kind, ignoring");
        }

        Ok(vec![])
    }
}
