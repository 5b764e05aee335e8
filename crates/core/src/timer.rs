// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer identifier type for scheduled deadlines.
//!
//! Timer ids encode their purpose and session as `{kind}:{session_id}` so a
//! fired timer can be routed without a side table.

use crate::session::SessionId;

crate::define_id! {
    /// Unique identifier for a scheduled timer.
    pub struct TimerId;
}

impl TimerId {
    /// Cancel escalation step 1: SIGTERM if the cancel goes unacknowledged.
    pub fn cancel_term(session_id: &SessionId) -> Self {
        Self::new(format!("cancel-term:{}", session_id))
    }

    /// Cancel escalation step 2: SIGKILL if SIGTERM did not stick.
    pub fn cancel_kill(session_id: &SessionId) -> Self {
        Self::new(format!("cancel-kill:{}", session_id))
    }

    /// Grace window after a close request before force-killing the worker.
    pub fn close_grace(session_id: &SessionId) -> Self {
        Self::new(format!("close-grace:{}", session_id))
    }

    /// Deadline for a freshly spawned worker to report `WORKER_READY`.
    pub fn spawn_timeout(session_id: &SessionId) -> Self {
        Self::new(format!("spawn-timeout:{}", session_id))
    }

    pub fn is_cancel_term(&self) -> bool {
        self.0.starts_with("cancel-term:")
    }

    pub fn is_cancel_kill(&self) -> bool {
        self.0.starts_with("cancel-kill:")
    }

    pub fn is_close_grace(&self) -> bool {
        self.0.starts_with("close-grace:")
    }

    pub fn is_spawn_timeout(&self) -> bool {
        self.0.starts_with("spawn-timeout:")
    }

    /// The session this timer belongs to.
    pub fn session_id(&self) -> Option<SessionId> {
        self.0
            .split_once(':')
            .map(|(_, sid)| SessionId::new(sid))
            .filter(|sid| !sid.as_str().is_empty())
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
