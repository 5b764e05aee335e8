// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! REST client for the remote message service.

#[cfg(any(test, feature = "test-support"))]
mod fake;
mod http;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeRemote, RemoteCall};
pub use http::HttpRemote;

use async_trait::async_trait;
use milo_core::{HistoryEntry, Inbound, MessageId, SendPayload, SessionId, SessionStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from REST operations.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Permanent failures stop outbox retries: the request is doomed, not
    /// the transport.
    pub fn is_permanent(&self) -> bool {
        matches!(self.status(), Some(401 | 403 | 404))
    }
}

/// Pub/sub access grant returned by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubSubGrant {
    pub token: String,
    pub cmd_channel: String,
    pub evt_channel: String,
    pub subscribe_key: String,
    pub publish_key: String,
    /// Announced token lifetime in seconds.
    pub expires_in: u64,
}

/// REST surface the orchestrator consumes.
#[async_trait]
pub trait RemoteApi: Clone + Send + Sync + 'static {
    /// `POST /agent/heartbeat`. Returns the agent id the service assigned.
    async fn heartbeat(&self, active_sessions: &[String]) -> Result<String, RemoteError>;

    /// `GET /messages/pending`.
    async fn pending_messages(&self) -> Result<Vec<Inbound>, RemoteError>;

    /// `POST /messages/ack`.
    async fn ack_messages(&self, message_ids: &[MessageId]) -> Result<(), RemoteError>;

    /// `POST /messages/send`.
    async fn send_message(&self, payload: &SendPayload) -> Result<(), RemoteError>;

    /// `PATCH /sessions/:id`.
    async fn patch_session(
        &self,
        session_id: &SessionId,
        status: SessionStatus,
    ) -> Result<(), RemoteError>;

    /// `POST /pubnub/token/agent`.
    async fn pubsub_token(&self) -> Result<PubSubGrant, RemoteError>;

    /// `GET /messages/history`.
    async fn history(
        &self,
        session_id: &SessionId,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>, RemoteError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
