// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variable overrides for engine tunables.

use std::time::Duration;

fn secs_from_env(name: &str, default: u64) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(default))
}

fn u32_from_env(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default)
}

/// Cancel escalation step 1: SIGTERM this long after an unacknowledged
/// cancel (`MILO_CANCEL_TERM_SECS`, default 10).
pub fn cancel_term_delay() -> Duration {
    secs_from_env("MILO_CANCEL_TERM_SECS", 10)
}

/// Cancel escalation step 2: SIGKILL this long after the SIGTERM
/// (`MILO_CANCEL_KILL_SECS`, default 10).
pub fn cancel_kill_delay() -> Duration {
    secs_from_env("MILO_CANCEL_KILL_SECS", 10)
}

/// Grace window after `WORKER_CLOSE` before force-killing
/// (`MILO_CLOSE_GRACE_SECS`, default 15).
pub fn close_grace() -> Duration {
    secs_from_env("MILO_CLOSE_GRACE_SECS", 15)
}

/// Deadline for a fresh worker to report ready
/// (`MILO_SPAWN_TIMEOUT_SECS`, default 30).
pub fn spawn_timeout() -> Duration {
    secs_from_env("MILO_SPAWN_TIMEOUT_SECS", 30)
}

/// Outbox retry ceiling (`MILO_OUTBOX_MAX_RETRIES`, default 10).
pub fn outbox_max_retries() -> u32 {
    u32_from_env("MILO_OUTBOX_MAX_RETRIES", 10)
}

/// Entries drained per outbox flush (`MILO_OUTBOX_FLUSH_BATCH`, default 50).
pub fn outbox_flush_batch() -> u32 {
    u32_from_env("MILO_OUTBOX_FLUSH_BATCH", 50)
}

/// Messages fetched when rebuilding history for a respawned worker
/// (`MILO_HISTORY_LIMIT`, default 20).
pub fn history_limit() -> u32 {
    u32_from_env("MILO_HISTORY_LIMIT", 20)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
