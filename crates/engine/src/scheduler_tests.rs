// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use milo_core::SessionId;

#[test]
fn timers_fire_only_after_their_deadline() {
    let mut scheduler = Scheduler::new();
    let now = Instant::now();
    let id = TimerId::new("t-1");
    scheduler.set_timer(id.clone(), Duration::from_secs(10), now);

    assert!(scheduler.fired_timers(now + Duration::from_secs(9)).is_empty());

    let fired = scheduler.fired_timers(now + Duration::from_secs(10));
    assert_eq!(fired.len(), 1);
    assert!(matches!(&fired[0], Event::TimerFired { id: fired_id } if *fired_id == id));

    // Fired timers are consumed
    assert!(scheduler
        .fired_timers(now + Duration::from_secs(60))
        .is_empty());
}

#[test]
fn setting_a_timer_again_replaces_the_deadline() {
    let mut scheduler = Scheduler::new();
    let now = Instant::now();
    let id = TimerId::new("t-1");
    scheduler.set_timer(id.clone(), Duration::from_secs(5), now);
    scheduler.set_timer(id.clone(), Duration::from_secs(20), now);

    assert!(scheduler.fired_timers(now + Duration::from_secs(10)).is_empty());
    assert_eq!(scheduler.fired_timers(now + Duration::from_secs(20)).len(), 1);
}

#[test]
fn cancel_removes_a_pending_timer() {
    let mut scheduler = Scheduler::new();
    let now = Instant::now();
    let id = TimerId::new("t-1");
    scheduler.set_timer(id.clone(), Duration::from_secs(5), now);
    assert!(scheduler.has_timer(&id));

    scheduler.cancel_timer(&id);
    assert!(!scheduler.has_timer(&id));
    assert!(scheduler.fired_timers(now + Duration::from_secs(60)).is_empty());
}

#[test]
fn session_timers_cancel_together() {
    let mut scheduler = Scheduler::new();
    let now = Instant::now();
    let sid = SessionId::new("s-1");
    let other = SessionId::new("s-2");
    scheduler.set_timer(TimerId::cancel_term(&sid), Duration::from_secs(5), now);
    scheduler.set_timer(TimerId::cancel_kill(&sid), Duration::from_secs(10), now);
    scheduler.set_timer(TimerId::close_grace(&other), Duration::from_secs(5), now);

    scheduler.cancel_session_timers(&sid);

    let fired = scheduler.fired_timers(now + Duration::from_secs(60));
    assert_eq!(fired.len(), 1);
    assert!(
        matches!(&fired[0], Event::TimerFired { id } if id.session_id() == Some(other.clone()))
    );
}

#[test]
fn next_deadline_is_the_minimum() {
    let mut scheduler = Scheduler::new();
    let now = Instant::now();
    assert!(scheduler.next_deadline().is_none());

    scheduler.set_timer(TimerId::new("a"), Duration::from_secs(30), now);
    scheduler.set_timer(TimerId::new("b"), Duration::from_secs(10), now);
    assert_eq!(scheduler.next_deadline(), Some(now + Duration::from_secs(10)));
}
