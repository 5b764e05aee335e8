// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound pipeline: pub/sub publish plus durable outbox enqueue.
//!
//! The two destinations are independent dual-writes of one logical event.
//! Pub/sub failures are logged and ignored — the outbox row is the copy
//! that must survive, and the flusher delivers it over REST.

use crate::error::RuntimeError;
use milo_adapters::PubSub;
use milo_core::{AckPayload, Envelope, EventPayload, MessageId, OutboxKind, SendPayload};
use milo_storage::Store;
use parking_lot::Mutex;
use std::sync::Arc;

/// Fan-out point for everything the orchestrator tells the outside world.
#[derive(Clone)]
pub struct Outbound<P> {
    pubsub: P,
    store: Arc<Mutex<Store>>,
    agent_id: String,
}

impl<P: PubSub> Outbound<P> {
    pub fn new(pubsub: P, store: Arc<Mutex<Store>>, agent_id: String) -> Self {
        Self {
            pubsub,
            store,
            agent_id,
        }
    }

    fn stamp(&self, payload: EventPayload) -> Envelope {
        Envelope {
            agent_id: self.agent_id.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            payload,
        }
    }

    /// Publish to pub/sub. Best-effort: failures are logged, never fatal.
    pub async fn publish(&self, payload: EventPayload) {
        let envelope = self.stamp(payload);
        if let Err(e) = self.pubsub.publish(&envelope).await {
            tracing::debug!(error = %e, "pub/sub publish failed, outbox copy stands");
        }
    }

    /// Enqueue a durable `send_message` delivery. Returns the outbox id.
    pub fn enqueue_send(&self, payload: &SendPayload) -> Result<i64, RuntimeError> {
        let json = serde_json::to_string(payload)?;
        let store = self.store.lock();
        Ok(store.enqueue_outbox(
            OutboxKind::SendMessage,
            &json,
            Some(&payload.session_id),
        )?)
    }

    /// Enqueue a durable message acknowledgement.
    pub fn enqueue_ack(&self, message_ids: &[MessageId]) -> Result<i64, RuntimeError> {
        let payload = AckPayload {
            message_ids: message_ids.to_vec(),
        };
        let json = serde_json::to_string(&payload)?;
        let store = self.store.lock();
        Ok(store.enqueue_outbox(OutboxKind::AckMessage, &json, None)?)
    }

    /// Dual-write a user-visible reply: durable outbox row plus the
    /// low-latency pub/sub copy.
    pub async fn send_reply(&self, payload: SendPayload) -> Result<i64, RuntimeError> {
        let id = self.enqueue_send(&payload)?;
        self.publish(EventPayload::AgentMessage {
            session_id: payload.session_id.clone(),
            content: payload.content.clone(),
            context_size: None,
        })
        .await;
        Ok(id)
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }
}

#[cfg(test)]
#[path = "outbound_tests.rs"]
mod tests;
