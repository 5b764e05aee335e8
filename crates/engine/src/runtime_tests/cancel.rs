// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellation: the ladder, its acks, and the single confirmation.

use super::*;

const TERM_DELAY: Duration = Duration::from_secs(10);
const KILL_DELAY: Duration = Duration::from_secs(10);

async fn running_session(ctx: &mut TestContext) {
    ctx.user_message("m-1", "s-1", "long task").await;
    ctx.worker_emits("s-1", WorkerMsg::WorkerReady).await;
    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Running));
}

fn cancel_confirmations(ctx: &TestContext) -> usize {
    ctx.outbox_entries()
        .iter()
        .filter(|e| e.kind() == Some(milo_core::OutboxKind::SendMessage))
        .filter(|e| {
            serde_json::from_str::<SendPayload>(&e.payload)
                .map(|p| p.content == "Task cancelled.")
                .unwrap_or(false)
        })
        .count()
}

#[tokio::test]
async fn polite_cancel_acknowledged_by_worker() {
    let mut ctx = setup().await;
    running_session(&mut ctx).await;
    let task = ctx.current_task_id("s-1").unwrap();

    ctx.user_message("m-2", "s-1", "cancel").await;
    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Cancelling));
    assert!(matches!(
        ctx.sent_after_init("s-1").last(),
        Some(SupervisorMsg::WorkerCancel { task_id }) if *task_id == task
    ));

    ctx.worker_emits("s-1", WorkerMsg::WorkerTaskCancelled { task_id: task })
        .await;

    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Idle));
    assert!(ctx.current_task_id("s-1").is_none());
    assert_eq!(cancel_confirmations(&ctx), 1);

    // No escalation signals were needed
    assert!(ctx
        .workers
        .calls()
        .iter()
        .all(|c| !matches!(c, WorkerCall::Terminate { .. } | WorkerCall::Kill { .. })));
}

#[tokio::test]
async fn stubborn_worker_walks_the_full_ladder() {
    let mut ctx = setup().await;
    running_session(&mut ctx).await;

    // t=0: cancel IPC
    ctx.user_message("m-2", "s-1", "/cancel").await;
    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Cancelling));

    // t=N1: SIGTERM
    ctx.advance(TERM_DELAY).await;
    assert_eq!(
        ctx.workers
            .calls()
            .iter()
            .filter(|c| matches!(c, WorkerCall::Terminate { .. }))
            .count(),
        1
    );

    // t=N2: SIGKILL
    ctx.advance(KILL_DELAY).await;
    assert_eq!(
        ctx.workers
            .calls()
            .iter()
            .filter(|c| matches!(c, WorkerCall::Kill { .. }))
            .count(),
        1
    );

    // The kill lands; exactly one cancel confirmation either way
    ctx.worker_exits("s-1", None).await;
    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Dead));
    assert_eq!(cancel_confirmations(&ctx), 1);
    assert_eq!(ctx.session_status("s-1"), Some(SessionStatus::OpenIdle));
}

#[tokio::test]
async fn acknowledged_cancel_disarms_the_ladder() {
    let mut ctx = setup().await;
    running_session(&mut ctx).await;
    let task = ctx.current_task_id("s-1").unwrap();

    ctx.user_message("m-2", "s-1", "cancel").await;
    ctx.worker_emits("s-1", WorkerMsg::WorkerTaskCancelled { task_id: task })
        .await;

    // Deadlines pass without any signals
    ctx.advance(TERM_DELAY + KILL_DELAY + Duration::from_secs(5))
        .await;
    assert!(ctx
        .workers
        .calls()
        .iter()
        .all(|c| !matches!(c, WorkerCall::Terminate { .. } | WorkerCall::Kill { .. })));
}

#[tokio::test]
async fn queued_message_respawns_after_ladder_death() {
    let mut ctx = setup().await;
    running_session(&mut ctx).await;

    ctx.user_message("m-2", "s-1", "cancel").await;
    // A new request arrives while the cancel is in flight
    ctx.user_message("m-3", "s-1", "next please").await;
    assert_eq!(ctx.runtime.actor_queue_len(&SessionId::new("s-1")), 1);

    ctx.advance(TERM_DELAY).await;
    ctx.advance(KILL_DELAY).await;
    ctx.worker_exits("s-1", None).await;

    // The queued message triggered a fresh spawn
    assert_eq!(ctx.workers.spawn_count(), 2);
    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Spawning));

    ctx.worker_emits("s-1", WorkerMsg::WorkerReady).await;
    assert!(matches!(
        ctx.sent_after_init("s-1").last(),
        Some(SupervisorMsg::WorkerTask { content, .. }) if content == "next please"
    ));
}

#[tokio::test]
async fn cancel_while_waiting_for_user_cancels_the_task() {
    let mut ctx = setup().await;
    running_session(&mut ctx).await;
    let task = ctx.current_task_id("s-1").unwrap();

    ctx.worker_emits(
        "s-1",
        WorkerMsg::WorkerQuestion {
            tool_call_id: "tc-1".into(),
            question: "Proceed?".into(),
        },
    )
    .await;
    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::WaitingUser));

    ctx.user_message("m-2", "s-1", "cancel").await;
    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Cancelling));
    assert!(matches!(
        ctx.sent_after_init("s-1").last(),
        Some(SupervisorMsg::WorkerCancel { task_id }) if *task_id == task
    ));
}

#[tokio::test]
async fn second_cancel_while_cancelling_is_ignored() {
    let mut ctx = setup().await;
    running_session(&mut ctx).await;

    ctx.user_message("m-2", "s-1", "cancel").await;
    ctx.user_message("m-3", "s-1", "cancel").await;

    let cancels = ctx
        .sent_after_init("s-1")
        .into_iter()
        .filter(|m| matches!(m, SupervisorMsg::WorkerCancel { .. }))
        .count();
    assert_eq!(cancels, 1);
}
