// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn timer_kinds_are_disjoint() {
    let sid = SessionId::new("s-1");
    let term = TimerId::cancel_term(&sid);
    let kill = TimerId::cancel_kill(&sid);
    let grace = TimerId::close_grace(&sid);
    let spawn = TimerId::spawn_timeout(&sid);

    assert!(term.is_cancel_term() && !term.is_cancel_kill());
    assert!(kill.is_cancel_kill() && !kill.is_cancel_term());
    assert!(grace.is_close_grace() && !grace.is_spawn_timeout());
    assert!(spawn.is_spawn_timeout() && !spawn.is_close_grace());
}

#[test]
fn timer_recovers_session_id() {
    let sid = SessionId::new("s-42");
    assert_eq!(TimerId::cancel_term(&sid).session_id(), Some(sid.clone()));
    assert_eq!(TimerId::close_grace(&sid).session_id(), Some(sid));
}

#[test]
fn session_id_survives_colons_in_id() {
    let sid = SessionId::new("tenant:abc");
    let timer = TimerId::cancel_kill(&sid);
    assert_eq!(timer.session_id(), Some(SessionId::new("tenant:abc")));
}

#[test]
fn bare_timer_has_no_session() {
    assert_eq!(TimerId::new("heartbeat").session_id(), None);
    assert_eq!(TimerId::new("orphan:").session_id(), None);
}
