// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event handlers for the runtime.

mod control;
mod flush;
mod ingest;
mod lifecycle;
mod recovery;
mod timer;
mod worker;

use crate::error::RuntimeError;
use crate::runtime::Runtime;
use milo_adapters::{PubSub, RemoteApi, WorkerAdapter};
use milo_core::{Clock, Event};

impl<W, R, P, C> Runtime<W, R, P, C>
where
    W: WorkerAdapter,
    R: RemoteApi,
    P: PubSub,
    C: Clock,
{
    /// Process one event. Returned events are fed back into the loop by
    /// the daemon.
    pub async fn handle_event(&self, event: Event) -> Result<Vec<Event>, RuntimeError> {
        match event {
            Event::MessageReceived { message } => self.handle_message_received(message).await,
            Event::InboxRedrive { session_id } => self.handle_inbox_redrive(session_id).await,
            Event::WorkerEvent { session_id, msg } => {
                self.handle_worker_msg(&session_id, msg).await
            }
            Event::WorkerExited {
                session_id,
                exit_code,
            } => self.handle_worker_exited(&session_id, exit_code).await,
            Event::WorkerSpawnFailed { session_id, error } => {
                self.handle_worker_spawn_failed(&session_id, &error).await
            }
            Event::WorkerSendFailed {
                session_id,
                task_id,
                error,
            } => {
                self.handle_worker_send_failed(&session_id, task_id, &error)
                    .await
            }
            Event::TimerFired { id } => self.handle_timer_fired(&id).await,
            Event::OrphanExited { session_id } => self.handle_orphan_exited(&session_id).await,
            // Shutdown is a control signal for the daemon loop, not state.
            Event::Shutdown => Ok(vec![]),
        }
    }
}
