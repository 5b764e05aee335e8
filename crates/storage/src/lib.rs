// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! milo-storage: Durable store for the Milo agent daemon.
//!
//! A single embedded SQLite database holds three tables the orchestrator
//! leans on for crash safety: the inbox (message deduplication), the outbox
//! (pending REST deliveries), and the sessions table (worker pids and
//! lifecycle state). A fourth append-only table is the session audit log.
//! All operations are synchronous; callers wrap the store in a mutex and do
//! not hold other locks across calls.

mod inbox;
mod outbox;
mod session_log;
mod sessions;
mod store;
mod transcript;

pub use inbox::{InboxEntry, NewInboxEntry};
pub use outbox::OutboxEntry;
pub use session_log::{Sender, SessionLogEntry};
pub use sessions::SessionRecord;
pub use store::{Store, StoreError};
pub use transcript::TranscriptWriter;
