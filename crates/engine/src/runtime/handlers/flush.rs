// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbox flusher: drain unsent entries to REST in insertion order.

use crate::error::RuntimeError;
use crate::runtime::Runtime;
use milo_adapters::{PubSub, RemoteApi, RemoteError, WorkerAdapter};
use milo_core::{AckPayload, Clock, OutboxKind, SendPayload};
use milo_storage::OutboxEntry;

impl<W, R, P, C> Runtime<W, R, P, C>
where
    W: WorkerAdapter,
    R: RemoteApi,
    P: PubSub,
    C: Clock,
{
    /// Drain one batch of unsent outbox entries. Returns how many were
    /// delivered. Called from the daemon's flush ticker.
    pub async fn flush_outbox(&self) -> Result<usize, RuntimeError> {
        let entries = self.lock_store(|store| {
            store.get_unsent(
                crate::env::outbox_flush_batch() as usize,
                crate::env::outbox_max_retries(),
            )
        })?;
        if entries.is_empty() {
            return Ok(0);
        }

        let mut delivered = 0;
        for entry in entries {
            let id = entry.id;
            match self.dispatch_entry(&entry).await {
                Ok(()) => {
                    self.lock_store(|store| store.mark_sent(id))?;
                    delivered += 1;
                }
                Err(e) if e.is_permanent() => {
                    // A doomed request; retrying forever helps no one.
                    tracing::debug!(
                        outbox_id = id,
                        error = %e,
                        "permanent delivery failure, abandoning entry"
                    );
                    self.lock_store(|store| store.mark_sent(id))?;
                }
                Err(e) => {
                    tracing::warn!(outbox_id = id, error = %e, "outbox delivery failed");
                    self.lock_store(|store| store.mark_failed(id, &e.to_string()))?;
                }
            }
        }
        Ok(delivered)
    }

    async fn dispatch_entry(&self, entry: &OutboxEntry) -> Result<(), RemoteError> {
        match entry.kind() {
            Some(OutboxKind::AckMessage) => {
                let payload: AckPayload = serde_json::from_str(&entry.payload)
                    .map_err(|e| RemoteError::Decode(e.to_string()))?;
                self.remote.ack_messages(&payload.message_ids).await
            }
            Some(OutboxKind::SendMessage) => {
                let payload: SendPayload = serde_json::from_str(&entry.payload)
                    .map_err(|e| RemoteError::Decode(e.to_string()))?;
                self.remote.send_message(&payload).await
            }
            None => Err(RemoteError::Decode(format!(
                "unknown outbox kind: {}",
                entry.kind
            ))),
        }
    }
}
