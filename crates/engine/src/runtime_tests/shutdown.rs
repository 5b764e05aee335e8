// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator shutdown: sign-off, worker closes, straggler kills.

use super::*;

#[tokio::test]
async fn shutdown_signs_off_and_closes_workers() {
    let mut ctx = setup().await;
    ctx.ready_worker("s-1").await;
    ctx.ready_worker("s-2").await;

    ctx.runtime.begin_shutdown().await;

    assert_eq!(
        ctx.published_count(|p| matches!(
            p,
            EventPayload::AgentStatus { content } if content == "Agent signing off."
        )),
        1
    );
    for sid in ["s-1", "s-2"] {
        assert!(matches!(
            ctx.sent_after_init(sid).last(),
            Some(SupervisorMsg::WorkerClose)
        ));
        let log = ctx
            .store
            .lock()
            .get_session_messages(&SessionId::new(sid), 20)
            .unwrap();
        assert!(log.iter().any(|e| e.content.contains("shutting down")));
    }
}

#[tokio::test]
async fn stragglers_are_killed_after_the_grace_window() {
    let mut ctx = setup().await;
    ctx.ready_worker("s-1").await;
    ctx.ready_worker("s-2").await;

    ctx.runtime.begin_shutdown().await;
    // s-1 exits within the grace window, s-2 does not
    ctx.worker_exits("s-1", Some(0)).await;

    ctx.runtime.kill_remaining().await;

    let kills: Vec<SessionId> = ctx
        .workers
        .calls()
        .iter()
        .filter_map(|c| match c {
            WorkerCall::Kill { session_id } => Some(session_id.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(kills, vec![SessionId::new("s-2")]);
}

#[tokio::test]
async fn shutdown_with_no_workers_is_quiet() {
    let ctx = setup().await;
    ctx.runtime.begin_shutdown().await;
    ctx.runtime.kill_remaining().await;
    assert!(ctx.workers.calls().is_empty());
}
