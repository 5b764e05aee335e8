// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use milo_adapters::{FakeRemote, RemoteCall};
use milo_core::SessionId;

fn polled_message(id: &str) -> Inbound {
    Inbound::UserMessage {
        message_id: MessageId::new(id),
        session_id: SessionId::new("s-1"),
        session_type: "bot".into(),
        content: "hi".into(),
        timestamp: "2026-01-01T00:00:00Z".into(),
        session_name: None,
        ui_action: None,
        persona_id: None,
        persona_version_id: None,
        model: None,
    }
}

#[tokio::test]
async fn connected_tick_only_heartbeats() {
    let remote = FakeRemote::new();
    let (tx, mut rx) = mpsc::channel(8);

    heartbeat_tick(&remote, vec!["Session one".into()], true, &tx)
        .await
        .unwrap();

    let calls = remote.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(
        &calls[0],
        RemoteCall::Heartbeat { active_sessions } if active_sessions == &["Session one".to_string()]
    ));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn polling_tick_feeds_ingest_then_acks() {
    let remote = FakeRemote::new();
    remote.push_pending(vec![polled_message("m-1"), polled_message("m-2")]);
    let (tx, mut rx) = mpsc::channel(8);

    heartbeat_tick(&remote, vec![], false, &tx).await.unwrap();

    // Every pending message went through the event bus
    for expected in ["m-1", "m-2"] {
        match rx.try_recv().unwrap() {
            Event::MessageReceived {
                message: Inbound::UserMessage { message_id, .. },
            } => assert_eq!(message_id, MessageId::new(expected)),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    // Then one ack with exactly those ids
    let acked = remote.acked();
    assert_eq!(acked.len(), 1);
    assert_eq!(
        acked[0],
        vec![MessageId::new("m-1"), MessageId::new("m-2")]
    );
}

#[tokio::test]
async fn polling_tick_with_nothing_pending_skips_ack() {
    let remote = FakeRemote::new();
    let (tx, _rx) = mpsc::channel(8);

    heartbeat_tick(&remote, vec![], false, &tx).await.unwrap();

    assert!(remote.acked().is_empty());
}

#[tokio::test]
async fn heartbeat_failure_does_not_stop_the_poll() {
    let remote = FakeRemote::new();
    remote.set_heartbeat_error(milo_adapters::RemoteError::Transport("down".into()));
    remote.push_pending(vec![polled_message("m-1")]);
    let (tx, mut rx) = mpsc::channel(8);

    heartbeat_tick(&remote, vec![], false, &tx).await.unwrap();

    assert!(rx.try_recv().is_ok());
    assert_eq!(remote.acked().len(), 1);
}
