// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP pub/sub client: token-authenticated publish plus a long-poll
//! subscribe loop.
//!
//! The provider's exact wire format is hidden behind two endpoints:
//! `POST {base}/publish/{channel}` and `GET {base}/subscribe/{channel}`
//! with a cursor. Tokens come from the REST token endpoint and are
//! refreshed at 80% of their announced lifetime (1 minute floor).

use super::{PubSub, PubSubError};
use crate::remote::{PubSubGrant, RemoteApi, RemoteError};
use async_trait::async_trait;
use milo_core::{Envelope, Inbound};
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Fraction of the token lifetime after which we refresh.
const REFRESH_FRACTION: f64 = 0.8;

/// Floor for the refresh interval.
const MIN_REFRESH: Duration = Duration::from_secs(60);

/// When to refresh a token with the given announced lifetime.
pub(crate) fn refresh_delay(expires_in: Duration) -> Duration {
    let fraction = expires_in.mul_f64(REFRESH_FRACTION);
    fraction.max(MIN_REFRESH)
}

#[derive(Deserialize)]
struct SubscribeResponse {
    #[serde(default)]
    messages: Vec<serde_json::Value>,
    cursor: String,
}

struct TokenState {
    grant: PubSubGrant,
    refresh_at: Instant,
}

/// Pub/sub client over plain HTTP.
#[derive(Clone)]
pub struct HttpPubSub<R> {
    client: reqwest::Client,
    base_url: String,
    remote: R,
    token: Arc<Mutex<Option<TokenState>>>,
    connected: Arc<AtomicBool>,
}

impl<R: RemoteApi> HttpPubSub<R> {
    pub fn new(base_url: impl Into<String>, remote: R) -> Result<Self, PubSubError> {
        let client = reqwest::Client::builder()
            .timeout(crate::env::pubsub_poll_window() + crate::env::http_timeout())
            .build()
            .map_err(|e| PubSubError::NotConnected(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            remote,
            token: Arc::new(Mutex::new(None)),
            connected: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Current grant, fetching or refreshing through the REST API as needed.
    async fn grant(&self) -> Result<PubSubGrant, RemoteError> {
        {
            let token = self.token.lock();
            if let Some(ref state) = *token {
                if Instant::now() < state.refresh_at {
                    return Ok(state.grant.clone());
                }
            }
        }

        let grant = self.remote.pubsub_token().await?;
        let delay = refresh_delay(Duration::from_secs(grant.expires_in));
        tracing::debug!(
            expires_in = grant.expires_in,
            refresh_in_secs = delay.as_secs(),
            "pub/sub token refreshed"
        );
        *self.token.lock() = Some(TokenState {
            grant: grant.clone(),
            refresh_at: Instant::now() + delay,
        });
        Ok(grant)
    }

    /// Long-poll the command channel forever, feeding parsed payloads into
    /// `tx`. Flips the connected flag as polls succeed and fail. Returns
    /// when the receiver side is dropped.
    pub async fn run_subscriber(self, tx: mpsc::Sender<Inbound>) {
        let mut cursor = String::from("0");
        loop {
            let grant = match self.grant().await {
                Ok(g) => g,
                Err(e) => {
                    self.connected.store(false, Ordering::SeqCst);
                    tracing::warn!(error = %e, "pub/sub token fetch failed");
                    tokio::time::sleep(crate::env::pubsub_backoff()).await;
                    continue;
                }
            };

            let url = format!(
                "{}/subscribe/{}/{}",
                self.base_url, grant.subscribe_key, grant.cmd_channel
            );
            let window = crate::env::pubsub_poll_window().as_secs().to_string();
            let result = self
                .client
                .get(&url)
                .query(&[("cursor", cursor.as_str()), ("window", window.as_str())])
                .bearer_auth(&grant.token)
                .send()
                .await;

            let response = match result {
                Ok(r) if r.status().is_success() => r,
                Ok(r) => {
                    self.connected.store(false, Ordering::SeqCst);
                    tracing::warn!(status = %r.status(), "pub/sub subscribe rejected");
                    // A rejected token is stale regardless of its clock
                    if r.status().as_u16() == 401 || r.status().as_u16() == 403 {
                        *self.token.lock() = None;
                    }
                    tokio::time::sleep(crate::env::pubsub_backoff()).await;
                    continue;
                }
                Err(e) => {
                    self.connected.store(false, Ordering::SeqCst);
                    tracing::warn!(error = %e, "pub/sub subscribe failed");
                    tokio::time::sleep(crate::env::pubsub_backoff()).await;
                    continue;
                }
            };

            let parsed: SubscribeResponse = match response.json().await {
                Ok(p) => p,
                Err(e) => {
                    self.connected.store(false, Ordering::SeqCst);
                    tracing::warn!(error = %e, "pub/sub subscribe decode failed");
                    tokio::time::sleep(crate::env::pubsub_backoff()).await;
                    continue;
                }
            };

            self.connected.store(true, Ordering::SeqCst);
            cursor = parsed.cursor;

            for raw in parsed.messages {
                match serde_json::from_value::<Inbound>(raw) {
                    Ok(message) => {
                        if tx.send(message).await.is_err() {
                            return; // Ingest side gone; stop polling
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "dropping unparseable pub/sub payload");
                    }
                }
            }
        }
    }
}

#[async_trait]
impl<R: RemoteApi> PubSub for HttpPubSub<R> {
    async fn publish(&self, event: &Envelope) -> Result<(), PubSubError> {
        let grant = self
            .grant()
            .await
            .map_err(|e| PubSubError::NotConnected(e.to_string()))?;

        let url = format!(
            "{}/publish/{}/{}",
            self.base_url, grant.publish_key, grant.evt_channel
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&grant.token)
            .json(event)
            .send()
            .await
            .map_err(|e| PubSubError::PublishFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PubSubError::PublishFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }

    fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
