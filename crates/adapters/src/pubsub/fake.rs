// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake pub/sub client for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{PubSub, PubSubError};
use async_trait::async_trait;
use milo_core::{Envelope, EventPayload};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Fake pub/sub client: captures published envelopes, scriptable
/// connectivity and publish failures.
#[derive(Clone, Default)]
pub struct FakePubSub {
    published: Arc<Mutex<Vec<Envelope>>>,
    connected: Arc<AtomicBool>,
    fail_publish: Arc<AtomicBool>,
}

impl FakePubSub {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.connected.store(true, Ordering::SeqCst);
        fake
    }

    /// All published envelopes, in order.
    pub fn published(&self) -> Vec<Envelope> {
        self.published.lock().clone()
    }

    /// Published payloads only (envelope stamping stripped).
    pub fn payloads(&self) -> Vec<EventPayload> {
        self.published.lock().iter().map(|e| e.payload.clone()).collect()
    }

    pub fn clear(&self) {
        self.published.lock().clear();
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Make every publish fail until reset.
    pub fn set_fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PubSub for FakePubSub {
    async fn publish(&self, event: &Envelope) -> Result<(), PubSubError> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(PubSubError::PublishFailed("scripted failure".into()));
        }
        self.published.lock().push(event.clone());
        Ok(())
    }

    fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
