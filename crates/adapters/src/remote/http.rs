// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production REST client on reqwest.

use super::{PubSubGrant, RemoteApi, RemoteError};
use async_trait::async_trait;
use milo_core::{HistoryEntry, Inbound, MessageId, SendPayload, SessionId, SessionStatus};
use serde::Deserialize;
use serde_json::json;

/// REST client for the remote message service.
#[derive(Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeartbeatResponse {
    agent_id: String,
}

#[derive(Deserialize)]
struct PendingResponse {
    messages: Vec<Inbound>,
}

#[derive(Deserialize)]
struct HistoryResponse {
    messages: Vec<HistoryEntry>,
}

impl HttpRemote {
    /// Build a client with the configured per-call timeout.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(crate::env::http_timeout())
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.request(method, self.url(path));
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn send(req: reqwest::RequestBuilder) -> Result<reqwest::Response, RemoteError> {
        let response = req
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Self::check(response).await
    }
}

#[async_trait]
impl RemoteApi for HttpRemote {
    async fn heartbeat(&self, active_sessions: &[String]) -> Result<String, RemoteError> {
        let response = Self::send(
            self.request(reqwest::Method::POST, "/agent/heartbeat")
                .json(&json!({ "activeSessions": active_sessions })),
        )
        .await?;
        let parsed: HeartbeatResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(parsed.agent_id)
    }

    async fn pending_messages(&self) -> Result<Vec<Inbound>, RemoteError> {
        let response = Self::send(self.request(reqwest::Method::GET, "/messages/pending")).await?;
        let parsed: PendingResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(parsed.messages)
    }

    async fn ack_messages(&self, message_ids: &[MessageId]) -> Result<(), RemoteError> {
        Self::send(
            self.request(reqwest::Method::POST, "/messages/ack")
                .json(&json!({ "messageIds": message_ids })),
        )
        .await?;
        Ok(())
    }

    async fn send_message(&self, payload: &SendPayload) -> Result<(), RemoteError> {
        Self::send(
            self.request(reqwest::Method::POST, "/messages/send")
                .json(payload),
        )
        .await?;
        Ok(())
    }

    async fn patch_session(
        &self,
        session_id: &SessionId,
        status: SessionStatus,
    ) -> Result<(), RemoteError> {
        Self::send(
            self.request(
                reqwest::Method::PATCH,
                &format!("/sessions/{}", session_id),
            )
            .json(&json!({ "sessionStatus": status })),
        )
        .await?;
        Ok(())
    }

    async fn pubsub_token(&self) -> Result<PubSubGrant, RemoteError> {
        let response =
            Self::send(self.request(reqwest::Method::POST, "/pubnub/token/agent")).await?;
        response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn history(
        &self,
        session_id: &SessionId,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>, RemoteError> {
        let limit = limit.to_string();
        let response = Self::send(
            self.request(reqwest::Method::GET, "/messages/history")
                .query(&[("sessionId", session_id.as_str()), ("limit", limit.as_str())]),
        )
        .await?;
        let parsed: HistoryResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(parsed.messages)
    }
}
