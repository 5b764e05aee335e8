// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ingest router tests: dedup, acknowledgement, inline replies.

use super::*;

#[tokio::test]
async fn duplicate_message_is_fully_inert() {
    let ctx = setup().await;

    // Same messageId twice
    ctx.user_message("m-1", "s-1", "hi").await;
    ctx.user_message("m-1", "s-1", "hi").await;

    // One inbox row
    let rows = ctx.store.lock().get_unprocessed(10).unwrap();
    assert!(rows.is_empty(), "first arrival should be processed");

    // One fast receipt signal
    assert_eq!(
        ctx.published_count(|p| matches!(
            p,
            EventPayload::AgentStatus { content } if content == "Message received. Processing..."
        )),
        1
    );

    // One durable ack
    let acks: Vec<_> = ctx
        .outbox_entries()
        .into_iter()
        .filter(|e| e.kind() == Some(milo_core::OutboxKind::AckMessage))
        .collect();
    assert_eq!(acks.len(), 1);

    // One user audit entry
    let log = ctx
        .store
        .lock()
        .get_session_messages(&SessionId::new("s-1"), 10)
        .unwrap();
    assert_eq!(log.iter().filter(|e| e.sender == "user").count(), 1);

    // One spawn, one queued item
    assert_eq!(ctx.workers.spawn_count(), 1);
    assert_eq!(ctx.runtime.actor_queue_len(&SessionId::new("s-1")), 1);
}

#[tokio::test]
async fn first_message_creates_session_and_spawns() {
    let ctx = setup().await;
    ctx.user_message("m-1", "s-1", "hello").await;

    let record = ctx
        .store
        .lock()
        .get_session(&SessionId::new("s-1"))
        .unwrap()
        .unwrap();
    assert_eq!(record.worker_state, Some(milo_core::WorkerState::Starting));
    assert!(record.worker_pid.is_some());
    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Spawning));
}

#[tokio::test]
async fn list_models_is_answered_inline() {
    let ctx = setup().await;
    ctx.process(Event::MessageReceived {
        message: user_message_full("m-1", "s-1", "whatever", None, Some("LIST_MODELS")),
    })
    .await;

    // No worker involved
    assert_eq!(ctx.workers.spawn_count(), 0);

    // Realtime copy
    assert_eq!(
        ctx.published_count(|p| matches!(p, EventPayload::ModelsList { .. })),
        1
    );

    // Durable copy
    let replies = ctx.queued_replies();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].content.starts_with("Available models:"));

    // Row consumed
    assert!(ctx.store.lock().get_unprocessed(10).unwrap().is_empty());
}

#[tokio::test]
async fn status_command_is_answered_inline() {
    let ctx = setup().await;
    ctx.user_message("m-1", "s-1", "/status").await;

    assert_eq!(ctx.workers.spawn_count(), 0);
    let replies = ctx.queued_replies();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].content.contains("Session s-1"));
    assert!(replies[0].content.contains("Queued messages: 0"));
}

#[tokio::test]
async fn cancel_with_no_worker_reports_nothing_running() {
    let ctx = setup().await;
    ctx.user_message("m-1", "s-1", "/cancel").await;

    assert_eq!(ctx.workers.spawn_count(), 0);
    assert_eq!(
        ctx.published_count(|p| matches!(
            p,
            EventPayload::AgentStatus { content } if content == "No task is running."
        )),
        1
    );
}

#[tokio::test]
async fn unknown_ui_action_yields_failed_result() {
    let ctx = setup().await;
    ctx.process(Event::MessageReceived {
        message: Inbound::UiAction {
            action: "DO_A_FLIP".into(),
            session_id: None,
            payload: None,
        },
    })
    .await;

    assert_eq!(
        ctx.published_count(|p| matches!(
            p,
            EventPayload::UiActionResult { ok: false, .. }
        )),
        1
    );
}

#[tokio::test]
async fn session_name_is_stored_and_kept() {
    let ctx = setup().await;
    ctx.process(Event::MessageReceived {
        message: user_message_full("m-1", "s-1", "hi", Some("My project"), None),
    })
    .await;

    let record = ctx
        .store
        .lock()
        .get_session(&SessionId::new("s-1"))
        .unwrap()
        .unwrap();
    assert_eq!(record.name.as_deref(), Some("My project"));

    assert_eq!(ctx.runtime.active_session_names(), vec!["My project"]);
}
