// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer and deadline management.
//!
//! The daemon loop ticks once a second, drains fired timers, and feeds the
//! resulting events back through the runtime. Timers are keyed by
//! [`TimerId`], so re-setting one replaces the previous deadline.

use milo_core::{Event, TimerId};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Manages pending timers for the runtime.
#[derive(Debug, Default)]
pub struct Scheduler {
    timers: HashMap<TimerId, Instant>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) a timer.
    pub fn set_timer(&mut self, id: TimerId, delay: Duration, now: Instant) {
        self.timers.insert(id, now + delay);
    }

    /// Cancel a timer. Unknown ids are a no-op.
    pub fn cancel_timer(&mut self, id: &TimerId) {
        self.timers.remove(id);
    }

    /// Cancel every timer belonging to a session.
    pub fn cancel_session_timers(&mut self, session_id: &milo_core::SessionId) {
        self.timers
            .retain(|id, _| id.session_id().as_ref() != Some(session_id));
    }

    /// Drain all timers whose deadline has passed, as events.
    pub fn fired_timers(&mut self, now: Instant) -> Vec<Event> {
        let fired: Vec<TimerId> = self
            .timers
            .iter()
            .filter(|(_, fires_at)| **fires_at <= now)
            .map(|(id, _)| id.clone())
            .collect();

        fired
            .into_iter()
            .map(|id| {
                self.timers.remove(&id);
                Event::TimerFired { id }
            })
            .collect()
    }

    /// Whether a specific timer is pending.
    pub fn has_timer(&self, id: &TimerId) -> bool {
        self.timers.contains_key(id)
    }

    /// Next deadline across all timers, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().min().copied()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
