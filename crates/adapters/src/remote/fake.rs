// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake REST client for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{PubSubGrant, RemoteApi, RemoteError};
use async_trait::async_trait;
use milo_core::{HistoryEntry, Inbound, MessageId, SendPayload, SessionId, SessionStatus};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Recorded call to FakeRemote
#[derive(Debug, Clone)]
pub enum RemoteCall {
    Heartbeat { active_sessions: Vec<String> },
    PendingMessages,
    AckMessages { message_ids: Vec<MessageId> },
    SendMessage { payload: SendPayload },
    PatchSession { session_id: SessionId, status: SessionStatus },
    PubsubToken,
    History { session_id: SessionId, limit: u32 },
}

/// Fake REST client: records calls, scripts responses and failures.
#[derive(Clone, Default)]
pub struct FakeRemote {
    inner: Arc<Mutex<FakeRemoteState>>,
}

#[derive(Default)]
struct FakeRemoteState {
    calls: Vec<RemoteCall>,
    pending: VecDeque<Vec<Inbound>>,
    history: HashMap<SessionId, Vec<HistoryEntry>>,
    send_errors: VecDeque<RemoteError>,
    ack_error: Option<RemoteError>,
    heartbeat_error: Option<RemoteError>,
    grant: Option<PubSubGrant>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.inner.lock().calls.clone()
    }

    /// Payloads delivered through `send_message`, in order.
    pub fn sent_messages(&self) -> Vec<SendPayload> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                RemoteCall::SendMessage { payload } => Some(payload.clone()),
                _ => None,
            })
            .collect()
    }

    /// Message-id batches acked over REST, in order.
    pub fn acked(&self) -> Vec<Vec<MessageId>> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                RemoteCall::AckMessages { message_ids } => Some(message_ids.clone()),
                _ => None,
            })
            .collect()
    }

    /// Queue one batch for the next `pending_messages` poll.
    pub fn push_pending(&self, messages: Vec<Inbound>) {
        self.inner.lock().pending.push_back(messages);
    }

    pub fn set_history(&self, session_id: SessionId, entries: Vec<HistoryEntry>) {
        self.inner.lock().history.insert(session_id, entries);
    }

    /// Fail the next `send_message` calls, one error per call.
    pub fn push_send_error(&self, error: RemoteError) {
        self.inner.lock().send_errors.push_back(error);
    }

    pub fn set_ack_error(&self, error: RemoteError) {
        self.inner.lock().ack_error = Some(error);
    }

    pub fn set_heartbeat_error(&self, error: RemoteError) {
        self.inner.lock().heartbeat_error = Some(error);
    }

    pub fn set_grant(&self, grant: PubSubGrant) {
        self.inner.lock().grant = Some(grant);
    }
}

#[async_trait]
impl RemoteApi for FakeRemote {
    async fn heartbeat(&self, active_sessions: &[String]) -> Result<String, RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RemoteCall::Heartbeat {
            active_sessions: active_sessions.to_vec(),
        });
        if let Some(error) = inner.heartbeat_error.take() {
            return Err(error);
        }
        Ok("agent-fake".to_string())
    }

    async fn pending_messages(&self) -> Result<Vec<Inbound>, RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RemoteCall::PendingMessages);
        Ok(inner.pending.pop_front().unwrap_or_default())
    }

    async fn ack_messages(&self, message_ids: &[MessageId]) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RemoteCall::AckMessages {
            message_ids: message_ids.to_vec(),
        });
        if let Some(error) = inner.ack_error.take() {
            return Err(error);
        }
        Ok(())
    }

    async fn send_message(&self, payload: &SendPayload) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RemoteCall::SendMessage {
            payload: payload.clone(),
        });
        if let Some(error) = inner.send_errors.pop_front() {
            return Err(error);
        }
        Ok(())
    }

    async fn patch_session(
        &self,
        session_id: &SessionId,
        status: SessionStatus,
    ) -> Result<(), RemoteError> {
        self.inner.lock().calls.push(RemoteCall::PatchSession {
            session_id: session_id.clone(),
            status,
        });
        Ok(())
    }

    async fn pubsub_token(&self) -> Result<PubSubGrant, RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RemoteCall::PubsubToken);
        inner
            .grant
            .clone()
            .ok_or_else(|| RemoteError::Transport("no grant scripted".into()))
    }

    async fn history(
        &self,
        session_id: &SessionId,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>, RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RemoteCall::History {
            session_id: session_id.clone(),
            limit,
        });
        Ok(inner
            .history
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }
}
