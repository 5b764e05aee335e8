// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::store::Store;

fn entry<'a>(message_id: &'a MessageId, session_id: &'a SessionId) -> NewInboxEntry<'a> {
    NewInboxEntry {
        message_id,
        session_id,
        session_type: "bot",
        content: "hi",
        session_name: None,
        ui_action: None,
    }
}

#[test]
fn duplicate_message_id_is_not_new() {
    let store = Store::open_in_memory().unwrap();
    let m1 = MessageId::new("m-1");
    let s1 = SessionId::new("s-1");

    assert!(store.insert_inbox(entry(&m1, &s1)).unwrap());
    assert!(!store.insert_inbox(entry(&m1, &s1)).unwrap());

    // Exactly one row survives
    let rows = store.get_unprocessed(10).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].message_id, m1);
}

#[test]
fn mark_processed_is_idempotent_and_hides_rows() {
    let store = Store::open_in_memory().unwrap();
    let m1 = MessageId::new("m-1");
    let s1 = SessionId::new("s-1");
    store.insert_inbox(entry(&m1, &s1)).unwrap();

    store.mark_processed(&m1).unwrap();
    store.mark_processed(&m1).unwrap();
    store.mark_processed(&MessageId::new("never-seen")).unwrap();

    assert!(store.get_unprocessed(10).unwrap().is_empty());
}

#[test]
fn unprocessed_returns_oldest_first() {
    let store = Store::open_in_memory().unwrap();
    let s1 = SessionId::new("s-1");
    for i in 0..5 {
        let mid = MessageId::new(format!("m-{}", i));
        store.insert_inbox(entry(&mid, &s1)).unwrap();
    }

    let rows = store.get_unprocessed(3).unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.message_id.as_str()).collect();
    assert_eq!(ids, ["m-0", "m-1", "m-2"]);
}

#[test]
fn unprocessed_for_session_filters() {
    let store = Store::open_in_memory().unwrap();
    let s1 = SessionId::new("s-1");
    let s2 = SessionId::new("s-2");
    store.insert_inbox(entry(&MessageId::new("a"), &s1)).unwrap();
    store.insert_inbox(entry(&MessageId::new("b"), &s2)).unwrap();
    store.insert_inbox(entry(&MessageId::new("c"), &s1)).unwrap();
    store.mark_processed(&MessageId::new("a")).unwrap();

    let rows = store.get_unprocessed_for_session(&s1).unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.message_id.as_str()).collect();
    assert_eq!(ids, ["c"]);
}

#[test]
fn optional_fields_round_trip() {
    let store = Store::open_in_memory().unwrap();
    let m1 = MessageId::new("m-1");
    let s1 = SessionId::new("s-1");
    store
        .insert_inbox(NewInboxEntry {
            message_id: &m1,
            session_id: &s1,
            session_type: "chat",
            content: "cancel",
            session_name: Some("My chat"),
            ui_action: Some("CANCEL"),
        })
        .unwrap();

    let rows = store.get_unprocessed(1).unwrap();
    assert_eq!(rows[0].session_name.as_deref(), Some("My chat"));
    assert_eq!(rows[0].ui_action.as_deref(), Some("CANCEL"));
    assert_eq!(rows[0].session_type, "chat");
    assert!(!rows[0].processed);
}
