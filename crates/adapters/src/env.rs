// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variable overrides for adapter tunables.

use std::time::Duration;

fn secs_from_env(name: &str, default: u64) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(default))
}

/// Per-call timeout for REST requests (`MILO_HTTP_TIMEOUT_SECS`, default 30).
pub fn http_timeout() -> Duration {
    secs_from_env("MILO_HTTP_TIMEOUT_SECS", 30)
}

/// Long-poll window for the pub/sub subscribe call
/// (`MILO_PUBSUB_POLL_SECS`, default 25).
pub fn pubsub_poll_window() -> Duration {
    secs_from_env("MILO_PUBSUB_POLL_SECS", 25)
}

/// Backoff after a failed subscribe poll (`MILO_PUBSUB_BACKOFF_SECS`,
/// default 5).
pub fn pubsub_backoff() -> Duration {
    secs_from_env("MILO_PUBSUB_BACKOFF_SECS", 5)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
