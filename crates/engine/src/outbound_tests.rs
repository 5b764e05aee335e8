// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use milo_adapters::FakePubSub;
use milo_core::SessionId;

fn outbound() -> (Outbound<FakePubSub>, FakePubSub, Arc<Mutex<Store>>) {
    let pubsub = FakePubSub::new();
    let store = Arc::new(Mutex::new(Store::open_in_memory().unwrap()));
    let outbound = Outbound::new(pubsub.clone(), Arc::clone(&store), "milo".into());
    (outbound, pubsub, store)
}

#[tokio::test]
async fn publish_stamps_agent_identity() {
    let (outbound, pubsub, _store) = outbound();
    outbound
        .publish(EventPayload::AgentStatus {
            content: "hi".into(),
        })
        .await;

    let published = pubsub.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].agent_id, "milo");
    assert!(!published[0].timestamp.is_empty());
}

#[tokio::test]
async fn publish_failure_is_swallowed() {
    let (outbound, pubsub, _store) = outbound();
    pubsub.set_fail_publish(true);
    // Does not error; the outbox copy is the durable one
    outbound
        .publish(EventPayload::AgentStatus {
            content: "hi".into(),
        })
        .await;
    assert!(pubsub.published().is_empty());
}

#[tokio::test]
async fn send_reply_writes_outbox_and_pubsub() {
    let (outbound, pubsub, store) = outbound();
    let payload = SendPayload {
        session_id: SessionId::new("s-1"),
        content: "done".into(),
        form_data: None,
        file_data: None,
    };

    let id = outbound.send_reply(payload).await.unwrap();

    let entry = store.lock().get_outbox_entry(id).unwrap().unwrap();
    assert_eq!(entry.kind(), Some(OutboxKind::SendMessage));
    assert_eq!(entry.session_id, Some(SessionId::new("s-1")));
    let stored: SendPayload = serde_json::from_str(&entry.payload).unwrap();
    assert_eq!(stored.content, "done");

    assert!(matches!(
        &pubsub.payloads()[0],
        EventPayload::AgentMessage { content, .. } if content == "done"
    ));
}

#[tokio::test]
async fn enqueue_ack_round_trips_message_ids() {
    let (outbound, _pubsub, store) = outbound();
    let id = outbound
        .enqueue_ack(&[MessageId::new("m-1"), MessageId::new("m-2")])
        .unwrap();

    let entry = store.lock().get_outbox_entry(id).unwrap().unwrap();
    assert_eq!(entry.kind(), Some(OutboxKind::AckMessage));
    let stored: AckPayload = serde_json::from_str(&entry.payload).unwrap();
    assert_eq!(stored.message_ids.len(), 2);
}
