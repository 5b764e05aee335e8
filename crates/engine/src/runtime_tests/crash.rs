// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker crashes: synthetic failure, Dead state, respawn on demand.

use super::*;

#[tokio::test]
async fn crash_mid_task_fails_the_task_and_goes_dead() {
    let mut ctx = setup().await;
    ctx.user_message("m-1", "s-1", "work").await;
    ctx.worker_emits("s-1", WorkerMsg::WorkerReady).await;
    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Running));

    ctx.worker_exits("s-1", Some(137)).await;

    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Dead));
    assert!(ctx.current_task_id("s-1").is_none());

    // The failure is observable: error event plus a durable notice
    assert_eq!(
        ctx.published_count(|p| matches!(p, EventPayload::Error { .. })),
        1
    );
    assert!(ctx
        .queued_replies()
        .iter()
        .any(|r| r.content.contains("crashed")));

    // Engineering detail goes to the audit log, not the user
    let log = ctx
        .store
        .lock()
        .get_session_messages(&SessionId::new("s-1"), 10)
        .unwrap();
    assert!(log
        .iter()
        .any(|e| e.sender == "system" && e.content.contains("exited unexpectedly")));

    // Store reflects the dead worker
    let record = ctx
        .store
        .lock()
        .get_session(&SessionId::new("s-1"))
        .unwrap()
        .unwrap();
    assert_eq!(record.worker_state, Some(milo_core::WorkerState::Dead));
    assert_eq!(record.worker_pid, None);
}

#[tokio::test]
async fn cancel_in_flight_is_settled_by_the_crash() {
    let mut ctx = setup().await;
    ctx.user_message("m-1", "s-1", "work").await;
    ctx.worker_emits("s-1", WorkerMsg::WorkerReady).await;

    // A cancel in flight and a follow-up message queued behind it
    ctx.user_message("m-2", "s-1", "cancel").await;
    ctx.user_message("m-3", "s-1", "follow-up").await;

    ctx.worker_exits("s-1", None).await;

    // The cancel is settled by the death; the follow-up survives and
    // triggers a respawn.
    assert_eq!(ctx.workers.spawn_count(), 2);
    ctx.worker_emits("s-1", WorkerMsg::WorkerReady).await;
    assert!(matches!(
        ctx.sent_after_init("s-1").last(),
        Some(SupervisorMsg::WorkerTask { content, .. }) if content == "follow-up"
    ));
}

#[tokio::test]
async fn next_message_after_crash_respawns() {
    let mut ctx = setup().await;
    ctx.ready_worker("s-1").await;
    ctx.worker_exits("s-1", Some(1)).await;
    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Dead));
    assert_eq!(ctx.workers.spawn_count(), 1);

    ctx.user_message("m-9", "s-1", "try again").await;

    assert_eq!(ctx.workers.spawn_count(), 2);
    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Spawning));
}

#[tokio::test]
async fn death_during_spawn_does_not_loop() {
    let mut ctx = setup().await;
    ctx.user_message("m-1", "s-1", "work").await;
    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Spawning));

    // Dies before WORKER_READY
    ctx.worker_exits("s-1", Some(127)).await;

    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Dead));
    // No automatic respawn for a worker that cannot start
    assert_eq!(ctx.workers.spawn_count(), 1);
    assert_eq!(
        ctx.published_count(|p| matches!(
            p,
            EventPayload::Error { message } if message.contains("startup")
        )),
        1
    );

    // The queued message is still there; the user's next message retries
    ctx.user_message("m-2", "s-1", "hello?").await;
    assert_eq!(ctx.workers.spawn_count(), 2);
}

#[tokio::test]
async fn spawn_failure_is_reported() {
    let ctx = setup().await;
    ctx.workers.set_spawn_error(
        milo_adapters::WorkerAdapterError::SpawnFailed("no such binary".into()),
    );

    ctx.user_message("m-1", "s-1", "work").await;

    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Dead));
    assert_eq!(
        ctx.published_count(|p| matches!(
            p,
            EventPayload::Error { message } if message.contains("no such binary")
        )),
        1
    );
    assert!(ctx
        .queued_replies()
        .iter()
        .any(|r| r.content.contains("Failed to start")));
}

#[tokio::test]
async fn fatal_worker_error_fails_task_and_kills() {
    let mut ctx = setup().await;
    ctx.user_message("m-1", "s-1", "work").await;
    ctx.worker_emits("s-1", WorkerMsg::WorkerReady).await;

    ctx.worker_emits(
        "s-1",
        WorkerMsg::WorkerError {
            message: "model quota exhausted".into(),
            fatal: true,
        },
    )
    .await;

    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Dead));
    assert!(ctx.current_task_id("s-1").is_none());
    assert!(ctx
        .workers
        .calls()
        .iter()
        .any(|c| matches!(c, WorkerCall::Kill { .. })));
    assert!(ctx
        .queued_replies()
        .iter()
        .any(|r| r.content.contains("fatal error")));
}

#[tokio::test]
async fn non_fatal_error_changes_nothing() {
    let mut ctx = setup().await;
    ctx.user_message("m-1", "s-1", "work").await;
    ctx.worker_emits("s-1", WorkerMsg::WorkerReady).await;

    ctx.worker_emits(
        "s-1",
        WorkerMsg::WorkerError {
            message: "transient glitch".into(),
            fatal: false,
        },
    )
    .await;

    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Running));
    assert!(ctx.current_task_id("s-1").is_some());
    assert_eq!(
        ctx.published_count(|p| matches!(p, EventPayload::Error { .. })),
        1
    );
}

#[tokio::test]
async fn spawn_timeout_kills_a_silent_worker() {
    let mut ctx = setup().await;
    ctx.user_message("m-1", "s-1", "work").await;
    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Spawning));

    // Never emits WORKER_READY
    ctx.advance(Duration::from_secs(30)).await;

    assert!(ctx
        .workers
        .calls()
        .iter()
        .any(|c| matches!(c, WorkerCall::Kill { .. })));
    ctx.worker_exits("s-1", None).await;
    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Dead));
}
