// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background tasks: pub/sub subscription, heartbeat/poll, outbox flush,
//! orphan pollers.

use crate::lifecycle::DaemonRuntime;
use milo_adapters::{HttpPubSub, HttpRemote, PubSub, RemoteApi, RemoteError};
use milo_core::{Event, Inbound, MessageId, SessionId};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Subscribe to the pub/sub command channel and feed payloads into the
/// event bus. Runs until the bus closes.
pub fn spawn_pubsub_subscriber(
    pubsub: HttpPubSub<HttpRemote>,
    event_tx: mpsc::Sender<Event>,
) {
    let (inbound_tx, mut inbound_rx) = mpsc::channel::<Inbound>(64);
    tokio::spawn(pubsub.run_subscriber(inbound_tx));
    tokio::spawn(async move {
        while let Some(message) = inbound_rx.recv().await {
            if event_tx
                .send(Event::MessageReceived { message })
                .await
                .is_err()
            {
                return;
            }
        }
    });
}

/// Periodic heartbeat. While pub/sub is down this is also the ingest path:
/// pending messages are fetched, fed through the router, then acked.
pub fn spawn_heartbeat(
    runtime: Arc<DaemonRuntime>,
    remote: HttpRemote,
    pubsub: HttpPubSub<HttpRemote>,
    event_tx: mpsc::Sender<Event>,
) {
    tokio::spawn(async move {
        loop {
            let connected = pubsub.connected();
            let interval = if connected {
                crate::env::connected_heartbeat_interval()
            } else {
                crate::env::polling_heartbeat_interval()
            };
            tokio::time::sleep(interval).await;

            let active = runtime.active_session_names();
            if let Err(e) =
                heartbeat_tick(&remote, active, pubsub.connected(), &event_tx).await
            {
                tracing::warn!(error = %e, "heartbeat tick failed");
            }
        }
    });
}

/// One heartbeat tick. Split out so tests can drive it with fakes.
pub(crate) async fn heartbeat_tick<R: RemoteApi>(
    remote: &R,
    active_sessions: Vec<String>,
    pubsub_connected: bool,
    event_tx: &mpsc::Sender<Event>,
) -> Result<(), RemoteError> {
    match remote.heartbeat(&active_sessions).await {
        Ok(agent_id) => tracing::debug!(agent_id, "heartbeat ok"),
        Err(e) => tracing::warn!(error = %e, "heartbeat failed"),
    }

    if pubsub_connected {
        return Ok(());
    }

    // Poll mode: REST carries ingest.
    let pending = remote.pending_messages().await?;
    if pending.is_empty() {
        return Ok(());
    }
    tracing::info!(count = pending.len(), "polled pending messages");

    let mut polled_ids: Vec<MessageId> = Vec::new();
    for message in pending {
        if let Inbound::UserMessage { ref message_id, .. } = message {
            polled_ids.push(message_id.clone());
        }
        if event_tx
            .send(Event::MessageReceived { message })
            .await
            .is_err()
        {
            return Ok(());
        }
    }
    if !polled_ids.is_empty() {
        remote.ack_messages(&polled_ids).await?;
    }
    Ok(())
}

/// Periodic outbox drain.
pub fn spawn_flusher(runtime: Arc<DaemonRuntime>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(crate::env::flush_interval());
        loop {
            interval.tick().await;
            match runtime.flush_outbox().await {
                Ok(0) => {}
                Ok(delivered) => tracing::debug!(delivered, "outbox flushed"),
                Err(e) => tracing::warn!(error = %e, "outbox flush failed"),
            }
        }
    });
}

/// Watch one prior-run worker pid; release the session when it exits.
pub fn spawn_orphan_poller(
    runtime: Arc<DaemonRuntime>,
    session_id: SessionId,
    pid: u32,
    event_tx: mpsc::Sender<Event>,
) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(crate::env::orphan_poll_interval()).await;
            if runtime.probe_pid(pid) {
                tracing::trace!(session_id = %session_id, pid, "orphaned worker still alive");
                continue;
            }
            tracing::info!(session_id = %session_id, pid, "orphaned worker gone");
            let _ = event_tx.send(Event::OrphanExited { session_id }).await;
            return;
        }
    });
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
