// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Steering, answer routing, and form routing.

use super::*;
use milo_core::FormResponseStatus;

#[tokio::test]
async fn message_while_running_steers_without_queueing() {
    let mut ctx = setup().await;
    ctx.user_message("m-1", "s-1", "start").await;
    ctx.worker_emits("s-1", WorkerMsg::WorkerReady).await;
    let task = ctx.current_task_id("s-1").unwrap();

    ctx.user_message("m-2", "s-1", "actually, use tabs").await;

    // Exactly one steer, zero queue growth
    let steers: Vec<_> = ctx
        .sent_after_init("s-1")
        .into_iter()
        .filter_map(|m| match m {
            SupervisorMsg::WorkerSteer { task_id, content } => Some((task_id, content)),
            _ => None,
        })
        .collect();
    assert_eq!(steers.len(), 1);
    assert_eq!(steers[0].0, task);
    assert_eq!(steers[0].1, "actually, use tabs");
    assert_eq!(ctx.runtime.actor_queue_len(&SessionId::new("s-1")), 0);
    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Running));
}

#[tokio::test]
async fn question_then_answer_round_trip() {
    let mut ctx = setup().await;
    ctx.user_message("m-1", "s-1", "start").await;
    ctx.worker_emits("s-1", WorkerMsg::WorkerReady).await;

    ctx.worker_emits(
        "s-1",
        WorkerMsg::WorkerQuestion {
            tool_call_id: "tc-7".into(),
            question: "Overwrite?".into(),
        },
    )
    .await;

    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::WaitingUser));
    assert_eq!(
        ctx.session_status("s-1"),
        Some(SessionStatus::OpenWaitingUser)
    );
    // The pending tool call survives a restart
    let record = ctx
        .store
        .lock()
        .get_session(&SessionId::new("s-1"))
        .unwrap()
        .unwrap();
    assert_eq!(record.pending_tool_call.as_deref(), Some("tc-7"));
    // The question reached the user durably
    assert!(ctx.queued_replies().iter().any(|r| r.content == "Overwrite?"));

    ctx.user_message("m-2", "s-1", "yes").await;

    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Running));
    let answers: Vec<_> = ctx
        .sent_after_init("s-1")
        .into_iter()
        .filter_map(|m| match m {
            SupervisorMsg::WorkerAnswer {
                tool_call_id,
                answer,
            } => Some((tool_call_id, answer)),
            _ => None,
        })
        .collect();
    assert_eq!(answers, vec![("tc-7".to_string(), "yes".to_string())]);
    // No queue growth
    assert_eq!(ctx.runtime.actor_queue_len(&SessionId::new("s-1")), 0);
    // Cleared once answered
    let record = ctx
        .store
        .lock()
        .get_session(&SessionId::new("s-1"))
        .unwrap()
        .unwrap();
    assert_eq!(record.pending_tool_call, None);
}

#[tokio::test]
async fn form_request_then_response_round_trip() {
    let mut ctx = setup().await;
    ctx.user_message("m-1", "s-1", "deploy").await;
    ctx.worker_emits("s-1", WorkerMsg::WorkerReady).await;

    let form = serde_json::json!({"fields": [{"name": "env", "type": "select"}]});
    ctx.worker_emits(
        "s-1",
        WorkerMsg::WorkerFormRequest {
            form_id: "f-1".into(),
            form: form.clone(),
        },
    )
    .await;

    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::WaitingUser));
    assert_eq!(
        ctx.session_status("s-1"),
        Some(SessionStatus::OpenInputRequired)
    );
    assert_eq!(
        ctx.published_count(|p| matches!(p, EventPayload::FormRequest { .. })),
        1
    );
    // Durable copy carries the form blob
    assert!(ctx
        .queued_replies()
        .iter()
        .any(|r| r.form_data.as_ref() == Some(&form)));

    ctx.process(Event::MessageReceived {
        message: Inbound::FormResponse {
            form_id: "f-1".into(),
            status: FormResponseStatus::Submitted,
            values: Some(serde_json::json!({"env": "staging"})),
        },
    })
    .await;

    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Running));
    let forwarded: Vec<_> = ctx
        .sent_after_init("s-1")
        .into_iter()
        .filter(|m| matches!(m, SupervisorMsg::WorkerFormResponse { .. }))
        .collect();
    assert_eq!(forwarded.len(), 1);
}

#[tokio::test]
async fn form_response_after_worker_death_expires() {
    let mut ctx = setup().await;
    ctx.user_message("m-1", "s-1", "deploy").await;
    ctx.worker_emits("s-1", WorkerMsg::WorkerReady).await;
    ctx.worker_emits(
        "s-1",
        WorkerMsg::WorkerFormRequest {
            form_id: "f-1".into(),
            form: serde_json::json!({}),
        },
    )
    .await;

    ctx.worker_exits("s-1", Some(1)).await;

    ctx.process(Event::MessageReceived {
        message: Inbound::FormResponse {
            form_id: "f-1".into(),
            status: FormResponseStatus::Submitted,
            values: None,
        },
    })
    .await;

    assert!(ctx
        .queued_replies()
        .iter()
        .any(|r| r.content.contains("expired")));
    // Nothing was forwarded anywhere
    assert!(ctx
        .sent_after_init("s-1")
        .iter()
        .all(|m| !matches!(m, SupervisorMsg::WorkerFormResponse { .. })));
}

#[tokio::test]
async fn form_response_for_unknown_form_is_reported() {
    let ctx = setup().await;
    ctx.process(Event::MessageReceived {
        message: Inbound::FormResponse {
            form_id: "f-ghost".into(),
            status: FormResponseStatus::Cancelled,
            values: None,
        },
    })
    .await;

    assert_eq!(
        ctx.published_count(|p| matches!(p, EventPayload::Error { .. })),
        1
    );
}

#[tokio::test]
async fn stream_text_rides_pubsub_only() {
    let mut ctx = setup().await;
    ctx.user_message("m-1", "s-1", "start").await;
    ctx.worker_emits("s-1", WorkerMsg::WorkerReady).await;

    ctx.worker_emits(
        "s-1",
        WorkerMsg::WorkerStreamText {
            text: "partial...".into(),
        },
    )
    .await;

    assert_eq!(
        ctx.published_count(|p| matches!(
            p,
            EventPayload::AgentMessage { content, .. } if content == "partial..."
        )),
        1
    );
    // No outbox row for stream fragments
    assert!(ctx.queued_replies().is_empty());
}

#[tokio::test]
async fn project_set_is_persisted_and_announced() {
    let mut ctx = setup().await;
    ctx.user_message("m-1", "s-1", "start").await;
    ctx.worker_emits("s-1", WorkerMsg::WorkerReady).await;

    ctx.worker_emits(
        "s-1",
        WorkerMsg::WorkerProjectSet {
            project_path: "/work/projects/api".into(),
        },
    )
    .await;

    let record = ctx
        .store
        .lock()
        .get_session(&SessionId::new("s-1"))
        .unwrap()
        .unwrap();
    assert_eq!(
        record.project_path.as_deref(),
        Some(std::path::Path::new("/work/projects/api"))
    );
    assert_eq!(
        ctx.published_count(|p| matches!(p, EventPayload::SessionUpdate { .. })),
        1
    );
}

#[tokio::test]
async fn failed_tool_end_is_audited() {
    let mut ctx = setup().await;
    ctx.user_message("m-1", "s-1", "start").await;
    ctx.worker_emits("s-1", WorkerMsg::WorkerReady).await;

    ctx.worker_emits(
        "s-1",
        WorkerMsg::WorkerToolEnd {
            tool_call_id: "tc-1".into(),
            tool: "shell".into(),
            ok: false,
            detail: Some("permission denied".into()),
        },
    )
    .await;

    assert_eq!(
        ctx.published_count(|p| matches!(
            p,
            EventPayload::ToolUse { ok: Some(false), .. }
        )),
        1
    );
    let log = ctx
        .store
        .lock()
        .get_session_messages(&SessionId::new("s-1"), 10)
        .unwrap();
    assert!(log
        .iter()
        .any(|e| e.sender == "system" && e.content.contains("permission denied")));
}
