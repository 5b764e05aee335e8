// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variable configuration for the daemon.

use std::path::PathBuf;
use std::time::Duration;

fn secs_from_env(name: &str, default: u64) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(default))
}

/// State directory: `MILO_STATE_DIR`, then `$XDG_STATE_HOME/milo`, then
/// `~/.local/state/milo`.
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("MILO_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("milo"));
    }
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".local/state/milo"))
}

/// Base URL of the remote message service (`MILO_API_URL`).
pub fn api_url() -> String {
    std::env::var("MILO_API_URL").unwrap_or_else(|_| "http://localhost:8787".into())
}

/// API key from the environment (`MILO_API_KEY`); the `.env` fallback is
/// handled in lifecycle.
pub fn api_key() -> Option<String> {
    std::env::var("MILO_API_KEY").ok().filter(|k| !k.is_empty())
}

/// Pub/sub base URL (`MILO_PUBSUB_URL`, defaults to the API URL).
pub fn pubsub_url() -> String {
    std::env::var("MILO_PUBSUB_URL").unwrap_or_else(|_| api_url())
}

/// Worker binary (`MILO_WORKER_BIN`, default `milo-worker` on PATH).
pub fn worker_bin() -> PathBuf {
    std::env::var("MILO_WORKER_BIN")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("milo-worker"))
}

/// Heartbeat cadence while the realtime channel is down and REST polling
/// carries ingest (`MILO_POLL_INTERVAL_SECS`, default 180).
pub fn polling_heartbeat_interval() -> Duration {
    secs_from_env("MILO_POLL_INTERVAL_SECS", 180)
}

/// Heartbeat cadence while pub/sub is connected
/// (`MILO_HEARTBEAT_INTERVAL_SECS`, default 300).
pub fn connected_heartbeat_interval() -> Duration {
    secs_from_env("MILO_HEARTBEAT_INTERVAL_SECS", 300)
}

/// Outbox flush cadence (`MILO_FLUSH_INTERVAL_SECS`, default 10).
pub fn flush_interval() -> Duration {
    secs_from_env("MILO_FLUSH_INTERVAL_SECS", 10)
}

/// Poll cadence for a held prior-run worker pid
/// (`MILO_ORPHAN_POLL_SECS`, default 10).
pub fn orphan_poll_interval() -> Duration {
    secs_from_env("MILO_ORPHAN_POLL_SECS", 10)
}

/// Grace window between close requests and kills at shutdown
/// (`MILO_SHUTDOWN_GRACE_SECS`, default 10).
pub fn shutdown_grace() -> Duration {
    secs_from_env("MILO_SHUTDOWN_GRACE_SECS", 10)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
