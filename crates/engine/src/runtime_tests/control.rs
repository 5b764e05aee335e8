// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control actions: delete session, update checks, skill management.

use super::*;

async fn ui_action(ctx: &TestContext, action: &str, session_id: Option<&str>, payload: Option<serde_json::Value>) {
    ctx.process(Event::MessageReceived {
        message: Inbound::UiAction {
            action: action.into(),
            session_id: session_id.map(SessionId::new),
            payload,
        },
    })
    .await;
}

fn ui_results(ctx: &TestContext) -> Vec<(String, bool, Option<String>)> {
    ctx.pubsub
        .payloads()
        .into_iter()
        .filter_map(|p| match p {
            EventPayload::UiActionResult { action, ok, detail } => Some((action, ok, detail)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn delete_session_closes_a_live_actor() {
    let mut ctx = setup().await;
    ctx.ready_worker("s-1").await;

    ui_action(&ctx, "DELETE_SESSION", Some("s-1"), None).await;

    assert_eq!(ctx.actor_state("s-1"), Some(ActorState::Dying));
    assert!(matches!(
        ctx.sent_after_init("s-1").last(),
        Some(SupervisorMsg::WorkerClose)
    ));

    ctx.worker_exits("s-1", Some(0)).await;
    assert_eq!(ctx.session_status("s-1"), Some(SessionStatus::Closed));
    assert_eq!(ui_results(&ctx), vec![("DELETE_SESSION".into(), true, None)]);
}

#[tokio::test]
async fn delete_session_without_an_actor_closes_the_record() {
    let ctx = setup().await;
    {
        let store = ctx.store.lock();
        store
            .upsert_session(&SessionId::new("s-9"), None, milo_core::SessionType::Bot)
            .unwrap();
    }

    ui_action(&ctx, "DELETE_SESSION", Some("s-9"), None).await;

    assert_eq!(ctx.session_status("s-9"), Some(SessionStatus::Closed));
}

#[tokio::test]
async fn delete_session_requires_a_session_id() {
    let ctx = setup().await;
    ui_action(&ctx, "DELETE_SESSION", None, None).await;

    let results = ui_results(&ctx);
    assert_eq!(results.len(), 1);
    assert!(!results[0].1);
    assert_eq!(results[0].2.as_deref(), Some("sessionId required"));
}

#[tokio::test]
async fn update_check_reports_the_version() {
    let ctx = setup().await;
    ui_action(&ctx, "check_milo_agent_updates", None, None).await;

    let results = ui_results(&ctx);
    assert_eq!(results.len(), 1);
    assert!(results[0].1);
    assert!(results[0].2.as_deref().unwrap().contains("0.0.0-test"));
}

#[tokio::test]
async fn skill_install_update_delete_cycle() {
    let ctx = setup().await;

    ui_action(
        &ctx,
        "skill_install",
        None,
        Some(serde_json::json!({"slug": "deployer", "content": "# Deploy"})),
    )
    .await;
    ui_action(
        &ctx,
        "skill_update",
        None,
        Some(serde_json::json!({"slug": "deployer", "content": "# Deploy v2"})),
    )
    .await;
    ui_action(
        &ctx,
        "skill_delete",
        None,
        Some(serde_json::json!({"slug": "deployer"})),
    )
    .await;

    let results = ui_results(&ctx);
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|(_, ok, _)| *ok));
}

#[tokio::test]
async fn skill_actions_validate_their_payload() {
    let ctx = setup().await;

    // Missing payload entirely
    ui_action(&ctx, "skill_install", None, None).await;
    // Missing content
    ui_action(
        &ctx,
        "skill_install",
        None,
        Some(serde_json::json!({"slug": "x"})),
    )
    .await;
    // Deleting something never installed
    ui_action(
        &ctx,
        "skill_delete",
        None,
        Some(serde_json::json!({"slug": "ghost"})),
    )
    .await;

    let results = ui_results(&ctx);
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|(_, ok, _)| !*ok));
}
