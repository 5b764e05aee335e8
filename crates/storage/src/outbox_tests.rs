// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::store::Store;
use milo_core::OutboxKind;

#[test]
fn enqueue_assigns_increasing_ids() {
    let store = Store::open_in_memory().unwrap();
    let a = store
        .enqueue_outbox(OutboxKind::AckMessage, r#"{"messageIds":["m-1"]}"#, None)
        .unwrap();
    let b = store
        .enqueue_outbox(
            OutboxKind::SendMessage,
            r#"{"sessionId":"s-1","content":"hi"}"#,
            Some(&SessionId::new("s-1")),
        )
        .unwrap();
    assert!(b > a);
}

#[test]
fn unsent_returns_insertion_order() {
    let store = Store::open_in_memory().unwrap();
    for i in 0..4 {
        store
            .enqueue_outbox(OutboxKind::SendMessage, &format!("{{\"n\":{}}}", i), None)
            .unwrap();
    }

    let rows = store.get_unsent(10, 10).unwrap();
    let payloads: Vec<&str> = rows.iter().map(|r| r.payload.as_str()).collect();
    assert_eq!(payloads, ["{\"n\":0}", "{\"n\":1}", "{\"n\":2}", "{\"n\":3}"]);
}

#[test]
fn sent_entries_never_come_back() {
    let store = Store::open_in_memory().unwrap();
    let id = store
        .enqueue_outbox(OutboxKind::SendMessage, "{}", None)
        .unwrap();
    store.mark_sent(id).unwrap();

    assert!(store.get_unsent(10, 10).unwrap().is_empty());
    let entry = store.get_outbox_entry(id).unwrap().unwrap();
    assert!(entry.sent);
}

#[test]
fn mark_failed_increments_retries_and_stores_error() {
    let store = Store::open_in_memory().unwrap();
    let id = store
        .enqueue_outbox(OutboxKind::SendMessage, "{}", None)
        .unwrap();

    store.mark_failed(id, "503 Service Unavailable").unwrap();
    let entry = store.get_outbox_entry(id).unwrap().unwrap();
    assert_eq!(entry.retries, 1);
    assert_eq!(entry.last_error.as_deref(), Some("503 Service Unavailable"));
    assert!(!entry.sent);

    // Still eligible for the next drain
    assert_eq!(store.get_unsent(10, 10).unwrap().len(), 1);
}

#[test]
fn retry_ceiling_removes_entry_from_drain_set() {
    let store = Store::open_in_memory().unwrap();
    let id = store
        .enqueue_outbox(OutboxKind::SendMessage, "{}", None)
        .unwrap();

    for _ in 0..3 {
        store.mark_failed(id, "boom").unwrap();
    }

    assert!(store.get_unsent(10, 3).unwrap().is_empty());
    // The row itself survives for inspection
    let entry = store.get_outbox_entry(id).unwrap().unwrap();
    assert_eq!(entry.retries, 3);
}

#[test]
fn typed_kind_accessor() {
    let store = Store::open_in_memory().unwrap();
    let id = store
        .enqueue_outbox(OutboxKind::AckMessage, "{}", None)
        .unwrap();
    let entry = store.get_outbox_entry(id).unwrap().unwrap();
    assert_eq!(entry.kind(), Some(OutboxKind::AckMessage));
}
