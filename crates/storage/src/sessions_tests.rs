// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::store::Store;
use std::path::Path;

#[test]
fn upsert_creates_then_refreshes() {
    let store = Store::open_in_memory().unwrap();
    let sid = SessionId::new("s-1");

    store
        .upsert_session(&sid, Some("First name"), SessionType::Bot)
        .unwrap();
    let rec = store.get_session(&sid).unwrap().unwrap();
    assert_eq!(rec.status, SessionStatus::OpenIdle);
    assert_eq!(rec.name.as_deref(), Some("First name"));

    // Re-upsert without a name keeps the old one
    store.upsert_session(&sid, None, SessionType::Bot).unwrap();
    let rec = store.get_session(&sid).unwrap().unwrap();
    assert_eq!(rec.name.as_deref(), Some("First name"));
}

#[test]
fn upsert_does_not_clobber_status_or_worker() {
    let store = Store::open_in_memory().unwrap();
    let sid = SessionId::new("s-1");
    store.upsert_session(&sid, None, SessionType::Bot).unwrap();
    store
        .update_session_status(&sid, SessionStatus::OpenRunning)
        .unwrap();
    store
        .update_worker_state(&sid, Some(WorkerState::Busy), Some(4321))
        .unwrap();

    store
        .upsert_session(&sid, Some("renamed"), SessionType::Bot)
        .unwrap();

    let rec = store.get_session(&sid).unwrap().unwrap();
    assert_eq!(rec.status, SessionStatus::OpenRunning);
    assert_eq!(rec.worker_pid, Some(4321));
    assert_eq!(rec.worker_state, Some(WorkerState::Busy));
    assert_eq!(rec.name.as_deref(), Some("renamed"));
}

#[test]
fn worker_state_can_be_cleared() {
    let store = Store::open_in_memory().unwrap();
    let sid = SessionId::new("s-1");
    store.upsert_session(&sid, None, SessionType::Bot).unwrap();
    store
        .update_worker_state(&sid, Some(WorkerState::Ready), Some(99))
        .unwrap();
    store.update_worker_state(&sid, None, None).unwrap();

    let rec = store.get_session(&sid).unwrap().unwrap();
    assert_eq!(rec.worker_pid, None);
    assert_eq!(rec.worker_state, None);
}

#[test]
fn active_sessions_excludes_closed() {
    let store = Store::open_in_memory().unwrap();
    for (id, status) in [
        ("s-1", SessionStatus::OpenIdle),
        ("s-2", SessionStatus::Closed),
        ("s-3", SessionStatus::Errored),
        ("s-4", SessionStatus::OpenPaused),
    ] {
        let sid = SessionId::new(id);
        store.upsert_session(&sid, None, SessionType::Bot).unwrap();
        store.update_session_status(&sid, status).unwrap();
    }

    let active = store.get_active_sessions().unwrap();
    let ids: Vec<&str> = active.iter().map(|r| r.session_id.as_str()).collect();
    assert_eq!(ids, ["s-1", "s-3", "s-4"]);
}

#[test]
fn confirmed_project_round_trips() {
    let store = Store::open_in_memory().unwrap();
    let sid = SessionId::new("s-1");
    store.upsert_session(&sid, None, SessionType::Bot).unwrap();
    store
        .update_confirmed_project(&sid, Path::new("/work/projects/api"))
        .unwrap();

    let rec = store.get_session(&sid).unwrap().unwrap();
    assert_eq!(
        rec.project_path.as_deref(),
        Some(Path::new("/work/projects/api"))
    );
}

#[test]
fn pending_routing_state_persists() {
    let store = Store::open_in_memory().unwrap();
    let sid = SessionId::new("s-1");
    store.upsert_session(&sid, None, SessionType::Chat).unwrap();

    store.set_pending_tool_call(&sid, Some("tc-7")).unwrap();
    store.set_pending_form(&sid, Some("f-2")).unwrap();
    let rec = store.get_session(&sid).unwrap().unwrap();
    assert_eq!(rec.pending_tool_call.as_deref(), Some("tc-7"));
    assert_eq!(rec.pending_form.as_deref(), Some("f-2"));

    store.set_pending_tool_call(&sid, None).unwrap();
    store.set_pending_form(&sid, None).unwrap();
    let rec = store.get_session(&sid).unwrap().unwrap();
    assert!(rec.pending_tool_call.is_none());
    assert!(rec.pending_form.is_none());
}

#[test]
fn find_session_by_pending_form() {
    let store = Store::open_in_memory().unwrap();
    let s1 = SessionId::new("s-1");
    let s2 = SessionId::new("s-2");
    store.upsert_session(&s1, None, SessionType::Bot).unwrap();
    store.upsert_session(&s2, None, SessionType::Bot).unwrap();
    store.set_pending_form(&s2, Some("f-9")).unwrap();

    let found = store.find_session_by_pending_form("f-9").unwrap().unwrap();
    assert_eq!(found.session_id, s2);
    assert!(store.find_session_by_pending_form("f-404").unwrap().is_none());
}

#[test]
fn missing_session_is_none() {
    let store = Store::open_in_memory().unwrap();
    assert!(store.get_session(&SessionId::new("nope")).unwrap().is_none());
}
