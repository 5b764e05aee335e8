// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbox flush: ordering, retries, permanent-failure classification.

use super::*;
use milo_adapters::{RemoteCall, RemoteError};
use milo_core::OutboxKind;

fn enqueue_send(ctx: &TestContext, session_id: &str, content: &str) -> i64 {
    let payload = SendPayload {
        session_id: SessionId::new(session_id),
        content: content.into(),
        form_data: None,
        file_data: None,
    };
    ctx.runtime.outbound().enqueue_send(&payload).unwrap()
}

#[tokio::test]
async fn transient_failure_then_success() {
    let ctx = setup().await;
    let id = enqueue_send(&ctx, "s-3", "hello");

    // First attempt: 503
    ctx.remote.push_send_error(RemoteError::Status {
        status: 503,
        body: "Service Unavailable".into(),
    });
    let delivered = ctx.runtime.flush_outbox().await.unwrap();
    assert_eq!(delivered, 0);

    let entry = ctx.store.lock().get_outbox_entry(id).unwrap().unwrap();
    assert_eq!(entry.retries, 1);
    assert!(entry.last_error.as_deref().unwrap_or("").contains("503"));
    assert!(!entry.sent);

    // Second attempt succeeds and the row is retired for good
    let delivered = ctx.runtime.flush_outbox().await.unwrap();
    assert_eq!(delivered, 1);
    let entry = ctx.store.lock().get_outbox_entry(id).unwrap().unwrap();
    assert!(entry.sent);

    // A third flush does not touch it again
    let sends_before = ctx.remote.sent_messages().len();
    ctx.runtime.flush_outbox().await.unwrap();
    assert_eq!(ctx.remote.sent_messages().len(), sends_before);
}

#[tokio::test]
async fn permanent_failure_abandons_the_entry() {
    let ctx = setup().await;
    let id = enqueue_send(&ctx, "s-1", "doomed");
    ctx.remote.push_send_error(RemoteError::Status {
        status: 404,
        body: "gone".into(),
    });

    let delivered = ctx.runtime.flush_outbox().await.unwrap();

    assert_eq!(delivered, 0);
    let entry = ctx.store.lock().get_outbox_entry(id).unwrap().unwrap();
    // Marked sent to stop retrying a doomed request
    assert!(entry.sent);
    assert_eq!(entry.retries, 0);

    // Exactly one delivery attempt was made
    assert_eq!(ctx.remote.sent_messages().len(), 1);
}

#[tokio::test]
async fn entries_flush_in_insertion_order() {
    let ctx = setup().await;
    ctx.runtime
        .outbound()
        .enqueue_ack(&[MessageId::new("m-1")])
        .unwrap();
    enqueue_send(&ctx, "s-1", "first");
    enqueue_send(&ctx, "s-1", "second");

    ctx.runtime.flush_outbox().await.unwrap();

    let calls = ctx.remote.calls();
    let relevant: Vec<String> = calls
        .iter()
        .filter_map(|c| match c {
            RemoteCall::AckMessages { message_ids } => {
                Some(format!("ack:{}", message_ids[0]))
            }
            RemoteCall::SendMessage { payload } => Some(format!("send:{}", payload.content)),
            _ => None,
        })
        .collect();
    assert_eq!(relevant, ["ack:m-1", "send:first", "send:second"]);
}

#[tokio::test]
async fn exhausted_entries_leave_the_drain_set() {
    let ctx = setup().await;
    let id = enqueue_send(&ctx, "s-1", "poison");
    // Burn through the default ceiling
    for _ in 0..10 {
        ctx.store.lock().mark_failed(id, "boom").unwrap();
    }

    ctx.runtime.flush_outbox().await.unwrap();

    // Never dispatched
    assert!(ctx.remote.sent_messages().is_empty());
    // Still inspectable, still unsent
    let entry = ctx.store.lock().get_outbox_entry(id).unwrap().unwrap();
    assert!(!entry.sent);
    assert_eq!(entry.retries, 10);
}

#[tokio::test]
async fn unparseable_payload_counts_toward_the_ceiling() {
    let ctx = setup().await;
    let id = {
        let store = ctx.store.lock();
        store
            .enqueue_outbox(OutboxKind::SendMessage, "this is not json", None)
            .unwrap()
    };

    ctx.runtime.flush_outbox().await.unwrap();

    let entry = ctx.store.lock().get_outbox_entry(id).unwrap().unwrap();
    assert_eq!(entry.retries, 1);
    assert!(!entry.sent);
    assert!(ctx.remote.sent_messages().is_empty());
}

#[tokio::test]
async fn a_failure_does_not_block_later_entries() {
    let ctx = setup().await;
    enqueue_send(&ctx, "s-1", "fails");
    enqueue_send(&ctx, "s-1", "succeeds");
    ctx.remote.push_send_error(RemoteError::Transport("reset".into()));

    let delivered = ctx.runtime.flush_outbox().await.unwrap();

    assert_eq!(delivered, 1);
    let contents: Vec<String> = ctx
        .remote
        .sent_messages()
        .into_iter()
        .map(|p| p.content)
        .collect();
    assert_eq!(contents, ["fails", "succeeds"]);
}
