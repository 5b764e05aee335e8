// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator shutdown: sign off, close workers, kill stragglers.

use crate::runtime::Runtime;
use milo_adapters::{PubSub, RemoteApi, WorkerAdapter};
use milo_core::{Clock, EventPayload, SessionId, SupervisorMsg};
use milo_storage::Sender;

impl<W, R, P, C> Runtime<W, R, P, C>
where
    W: WorkerAdapter,
    R: RemoteApi,
    P: PubSub,
    C: Clock,
{
    /// Sessions that still own a live child process.
    pub fn live_worker_sessions(&self) -> Vec<SessionId> {
        self.actors
            .lock()
            .values()
            .filter(|a| a.has_live_worker())
            .map(|a| a.session_id.clone())
            .collect()
    }

    /// First shutdown phase: announce, then ask every worker to close.
    /// The caller gives them a grace window before `kill_remaining`.
    pub async fn begin_shutdown(&self) {
        self.outbound
            .publish(EventPayload::AgentStatus {
                content: "Agent signing off.".into(),
            })
            .await;

        for session_id in self.live_worker_sessions() {
            self.audit(
                &session_id,
                Sender::System,
                "daemon shutting down; task interrupted",
                None,
            );
            if let Err(e) = self
                .workers
                .send(&session_id, &SupervisorMsg::WorkerClose)
                .await
            {
                tracing::warn!(session_id = %session_id, error = %e, "close on shutdown failed");
            }
        }
    }

    /// Second shutdown phase: whoever outlived the grace window dies now.
    pub async fn kill_remaining(&self) {
        for session_id in self.live_worker_sessions() {
            tracing::warn!(session_id = %session_id, "worker exceeded shutdown grace, killing");
            if let Err(e) = self.workers.kill(&session_id).await {
                tracing::debug!(session_id = %session_id, error = %e, "kill on shutdown failed");
            }
        }
    }
}
