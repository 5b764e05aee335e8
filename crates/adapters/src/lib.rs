// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! milo-adapters: Side-effect adapters for the Milo agent daemon.
//!
//! Each external dependency sits behind a trait with a production
//! implementation and a Fake for deterministic tests: worker subprocesses,
//! the remote REST API, and the pub/sub channel. The skill store and persona
//! cache are plain filesystem helpers.

pub mod env;
pub mod personas;
pub mod pubsub;
pub mod remote;
pub mod skills;
pub mod worker;

pub use personas::PersonaCache;
pub use pubsub::{HttpPubSub, PubSub, PubSubError};
pub use remote::{HttpRemote, PubSubGrant, RemoteApi, RemoteError};
pub use skills::{FsSkillStore, SkillStoreError};
pub use worker::{
    ProcessWorkerAdapter, WorkerAdapter, WorkerAdapterError, WorkerHandle, WorkerSpawnConfig,
};

#[cfg(any(test, feature = "test-support"))]
pub use pubsub::FakePubSub;
#[cfg(any(test, feature = "test-support"))]
pub use remote::{FakeRemote, RemoteCall};
#[cfg(any(test, feature = "test-support"))]
pub use worker::{FakeWorkerAdapter, WorkerCall};
