// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pub/sub channel to connected browsers.
//!
//! Publishing is best-effort: the durable copy of every event lives in the
//! outbox, so publish failures are logged and ignored. The subscribe side
//! feeds inbound payloads into the ingest path and flips a connected flag
//! the heartbeat ticker consults for its poll-mode decision.

#[cfg(any(test, feature = "test-support"))]
mod fake;
mod http;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakePubSub;
pub use http::HttpPubSub;

use async_trait::async_trait;
use milo_core::Envelope;
use thiserror::Error;

/// Errors from pub/sub operations.
#[derive(Debug, Clone, Error)]
pub enum PubSubError {
    #[error("not connected: {0}")]
    NotConnected(String),

    #[error("publish failed: {0}")]
    PublishFailed(String),
}

/// Publish surface the engine uses. Subscription is wired by the daemon
/// against the concrete client.
#[async_trait]
pub trait PubSub: Clone + Send + Sync + 'static {
    /// Fan an event out to connected browsers. Best-effort.
    async fn publish(&self, event: &Envelope) -> Result<(), PubSubError>;

    /// Whether the realtime channel is currently believed healthy.
    fn connected(&self) -> bool;
}
