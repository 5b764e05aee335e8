// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::store::Store;

#[test]
fn append_and_read_back_in_order() {
    let store = Store::open_in_memory().unwrap();
    let sid = SessionId::new("s-1");

    store
        .insert_session_message(&sid, Sender::User, "hi", Some(&MessageId::new("m-1")))
        .unwrap();
    store
        .insert_session_message(&sid, Sender::Agent, "hello!", None)
        .unwrap();
    store
        .insert_session_message(&sid, Sender::System, "task cancelled", None)
        .unwrap();

    let entries = store.get_session_messages(&sid, 10).unwrap();
    let senders: Vec<&str> = entries.iter().map(|e| e.sender.as_str()).collect();
    assert_eq!(senders, ["user", "agent", "system"]);
    assert_eq!(entries[0].message_id, Some(MessageId::new("m-1")));
    assert_eq!(entries[1].message_id, None);
}

#[test]
fn limit_keeps_most_recent_entries() {
    let store = Store::open_in_memory().unwrap();
    let sid = SessionId::new("s-1");
    for i in 0..5 {
        store
            .insert_session_message(&sid, Sender::User, &format!("msg {}", i), None)
            .unwrap();
    }

    let entries = store.get_session_messages(&sid, 2).unwrap();
    let contents: Vec<&str> = entries.iter().map(|e| e.content.as_str()).collect();
    assert_eq!(contents, ["msg 3", "msg 4"]);
}

#[test]
fn sessions_do_not_leak_into_each_other() {
    let store = Store::open_in_memory().unwrap();
    let s1 = SessionId::new("s-1");
    let s2 = SessionId::new("s-2");
    store
        .insert_session_message(&s1, Sender::User, "one", None)
        .unwrap();
    store
        .insert_session_message(&s2, Sender::User, "two", None)
        .unwrap();

    let entries = store.get_session_messages(&s1, 10).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].content, "one");
}

#[test]
fn sender_round_trips() {
    for sender in [Sender::User, Sender::Agent, Sender::System] {
        assert_eq!(Sender::parse(sender.as_str()), Some(sender));
    }
    assert_eq!(Sender::parse("robot"), None);
}
