// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch policy: one task at a time, high before normal, FIFO within.

use super::*;

#[tokio::test]
async fn ready_worker_picks_up_the_queued_message() {
    let mut ctx = setup().await;
    ctx.user_message("m-1", "s-1", "do the thing").await;
    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Spawning));

    ctx.worker_emits("s-1", WorkerMsg::WorkerReady).await;

    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Running));
    assert_eq!(ctx.session_status("s-1"), Some(SessionStatus::OpenRunning));
    let sent = ctx.sent_after_init("s-1");
    assert_eq!(sent.len(), 1);
    assert!(matches!(
        &sent[0],
        SupervisorMsg::WorkerTask { content, .. } if content == "do the thing"
    ));
}

#[tokio::test]
async fn high_priority_drains_before_normal() {
    let mut ctx = setup().await;
    // Everything arrives while the worker is still starting
    ctx.user_message("m-1", "s-1", "first").await;
    ctx.user_message("m-2", "s-1", "second").await;
    ctx.process(Event::MessageReceived {
        message: user_message_full("m-3", "s-1", "x", None, Some("CANCEL")),
    })
    .await;
    assert_eq!(ctx.runtime.actor_queue_len(&SessionId::new("s-1")), 3);

    ctx.worker_emits("s-1", WorkerMsg::WorkerReady).await;

    // The queued cancel settles first (nothing to cancel), then the first
    // user message becomes the task.
    assert_eq!(
        ctx.published_count(|p| matches!(
            p,
            EventPayload::AgentStatus { content } if content == "No task is running."
        )),
        1
    );
    let sent = ctx.sent_after_init("s-1");
    assert_eq!(sent.len(), 1);
    assert!(matches!(
        &sent[0],
        SupervisorMsg::WorkerTask { content, .. } if content == "first"
    ));
    // "second" still waits its turn
    assert_eq!(ctx.runtime.actor_queue_len(&SessionId::new("s-1")), 1);
}

#[tokio::test]
async fn at_most_one_task_per_actor() {
    let mut ctx = setup().await;
    ctx.user_message("m-1", "s-1", "first").await;
    ctx.worker_emits("s-1", WorkerMsg::WorkerReady).await;
    let task = ctx.current_task_id("s-1").unwrap();

    // A second message while running must not start a second task
    ctx.user_message("m-2", "s-1", "also this").await;

    assert_eq!(ctx.current_task_id("s-1"), Some(task));
    let tasks = ctx
        .sent_after_init("s-1")
        .into_iter()
        .filter(|m| matches!(m, SupervisorMsg::WorkerTask { .. }))
        .count();
    assert_eq!(tasks, 1);
}

#[tokio::test]
async fn normal_queue_is_fifo_across_task_completions() {
    let mut ctx = setup().await;
    ctx.user_message("m-1", "s-1", "one").await;
    ctx.worker_emits("s-1", WorkerMsg::WorkerReady).await;

    // Messages while Running steer instead of queueing, so finish the
    // task and kill the worker to build a real queue.
    let task = ctx.current_task_id("s-1").unwrap();
    ctx.worker_emits(
        "s-1",
        WorkerMsg::WorkerTaskDone {
            task_id: task,
            summary: None,
            context_size: None,
        },
    )
    .await;
    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Idle));

    // Kill the worker so new messages queue instead of steering
    ctx.worker_exits("s-1", Some(0)).await;
    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Dead));

    ctx.user_message("m-2", "s-1", "two").await;
    ctx.user_message("m-3", "s-1", "three").await;
    ctx.worker_emits("s-1", WorkerMsg::WorkerReady).await;

    let first = ctx
        .sent_after_init("s-1")
        .into_iter()
        .rev()
        .find_map(|m| match m {
            SupervisorMsg::WorkerTask { content, task_id, .. } => Some((content, task_id)),
            _ => None,
        })
        .unwrap();
    assert_eq!(first.0, "two");

    ctx.worker_emits(
        "s-1",
        WorkerMsg::WorkerTaskDone {
            task_id: first.1,
            summary: None,
            context_size: None,
        },
    )
    .await;

    let contents: Vec<String> = ctx
        .sent_after_init("s-1")
        .into_iter()
        .filter_map(|m| match m {
            SupervisorMsg::WorkerTask { content, .. } => Some(content),
            _ => None,
        })
        .collect();
    assert_eq!(contents.last().map(String::as_str), Some("three"));
}

#[tokio::test]
async fn task_done_sends_the_reply_and_goes_idle() {
    let mut ctx = setup().await;
    ctx.user_message("m-1", "s-1", "summarize").await;
    ctx.worker_emits("s-1", WorkerMsg::WorkerReady).await;
    let task = ctx.current_task_id("s-1").unwrap();

    ctx.worker_emits(
        "s-1",
        WorkerMsg::WorkerTaskDone {
            task_id: task,
            summary: Some("All done!".into()),
            context_size: Some(1234),
        },
    )
    .await;

    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Idle));
    assert_eq!(ctx.session_status("s-1"), Some(SessionStatus::OpenIdle));
    assert!(ctx.current_task_id("s-1").is_none());

    // Durable reply
    let replies = ctx.queued_replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].content, "All done!");

    // Realtime reply carries the context size
    assert_eq!(
        ctx.published_count(|p| matches!(
            p,
            EventPayload::AgentMessage { content, context_size, .. }
                if content == "All done!" && *context_size == Some(1234)
        )),
        1
    );

    // Agent reply audited
    let log = ctx
        .store
        .lock()
        .get_session_messages(&SessionId::new("s-1"), 10)
        .unwrap();
    assert!(log.iter().any(|e| e.sender == "agent" && e.content == "All done!"));
}

#[tokio::test]
async fn stale_task_done_is_ignored() {
    let mut ctx = setup().await;
    ctx.user_message("m-1", "s-1", "work").await;
    ctx.worker_emits("s-1", WorkerMsg::WorkerReady).await;

    ctx.worker_emits(
        "s-1",
        WorkerMsg::WorkerTaskDone {
            task_id: milo_core::TaskId::new("not-the-current-task"),
            summary: Some("bogus".into()),
            context_size: None,
        },
    )
    .await;

    // Still running the real task
    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Running));
    assert!(ctx.current_task_id("s-1").is_some());
    assert!(ctx.queued_replies().is_empty());
}

#[tokio::test]
async fn close_session_closes_and_removes_the_actor() {
    let mut ctx = setup().await;
    ctx.ready_worker("s-1").await;

    ctx.user_message("m-close", "s-1", "/close").await;
    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Dying));
    assert!(matches!(
        ctx.sent_after_init("s-1").last(),
        Some(SupervisorMsg::WorkerClose)
    ));

    ctx.worker_exits("s-1", Some(0)).await;
    assert_eq!(ctx.actor_state("s-1"), None);
    assert_eq!(ctx.session_status("s-1"), Some(SessionStatus::Closed));
}
