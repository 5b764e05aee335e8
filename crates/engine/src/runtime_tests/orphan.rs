// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orphan recovery: prior-run workers, deferral, and redrive.

use super::*;
use milo_core::{SessionType, WorkerState};

/// Persist a session that looks like it belonged to a previous run.
fn seed_prior_session(ctx: &TestContext, session_id: &str, pid: u32) {
    let sid = SessionId::new(session_id);
    let store = ctx.store.lock();
    store.upsert_session(&sid, None, SessionType::Bot).unwrap();
    store
        .update_session_status(&sid, SessionStatus::OpenRunning)
        .unwrap();
    store
        .update_worker_state(&sid, Some(WorkerState::Busy), Some(pid))
        .unwrap();
}

#[tokio::test]
async fn live_prior_worker_holds_the_session() {
    let ctx = setup().await;
    seed_prior_session(&ctx, "s-2", 1234);
    ctx.workers.add_alive_pid(1234);

    let orphans = ctx.runtime.recover_startup_sessions().await.unwrap();

    assert_eq!(orphans, vec![(SessionId::new("s-2"), 1234)]);
    assert!(ctx.runtime.is_orphaned(&SessionId::new("s-2")));
    assert_eq!(ctx.session_status("s-2"), Some(SessionStatus::OpenPaused));
}

#[tokio::test]
async fn messages_for_an_orphaned_session_are_deferred() {
    let ctx = setup().await;
    seed_prior_session(&ctx, "s-2", 1234);
    ctx.workers.add_alive_pid(1234);
    ctx.runtime.recover_startup_sessions().await.unwrap();

    ctx.user_message("m-1", "s-2", "are you there?").await;

    // No second worker while pid 1234 lives (dual-writer hazard)
    assert_eq!(ctx.workers.spawn_count(), 0);
    // The row stays unprocessed for the redrive
    let rows = ctx.store.lock().get_unprocessed(10).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].message_id, MessageId::new("m-1"));
    // But receipt-time work already happened: the ack is queued
    assert!(ctx
        .outbox_entries()
        .iter()
        .any(|e| e.kind() == Some(milo_core::OutboxKind::AckMessage)));
}

#[tokio::test]
async fn orphan_exit_closes_session_and_redrives() {
    let mut ctx = setup().await;
    seed_prior_session(&ctx, "s-2", 1234);
    ctx.workers.add_alive_pid(1234);
    ctx.runtime.recover_startup_sessions().await.unwrap();
    ctx.user_message("m-1", "s-2", "are you there?").await;

    // The prior-run pid finally exits
    ctx.workers.remove_alive_pid(1234);
    ctx.process(Event::OrphanExited {
        session_id: SessionId::new("s-2"),
    })
    .await;
    ctx.drain().await;

    assert!(!ctx.runtime.is_orphaned(&SessionId::new("s-2")));
    // Audit trail records the recovery
    let log = ctx
        .store
        .lock()
        .get_session_messages(&SessionId::new("s-2"), 20)
        .unwrap();
    assert!(log
        .iter()
        .any(|e| e.sender == "system" && e.content.contains("recovered")));

    // The deferred message was redriven: a worker is spawning for it now
    assert_eq!(ctx.workers.spawn_count(), 1);
    assert!(ctx.store.lock().get_unprocessed(10).unwrap().is_empty());
}

#[tokio::test]
async fn dead_prior_worker_is_closed_immediately() {
    let ctx = setup().await;
    seed_prior_session(&ctx, "s-3", 4321);
    // 4321 is not alive

    let orphans = ctx.runtime.recover_startup_sessions().await.unwrap();

    assert!(orphans.is_empty());
    assert_eq!(ctx.session_status("s-3"), Some(SessionStatus::Closed));
    let record = ctx
        .store
        .lock()
        .get_session(&SessionId::new("s-3"))
        .unwrap()
        .unwrap();
    assert_eq!(record.worker_pid, None);
    assert_eq!(record.worker_state, None);

    let log = ctx
        .store
        .lock()
        .get_session_messages(&SessionId::new("s-3"), 10)
        .unwrap();
    assert!(log.iter().any(|e| e.content.contains("closed at startup")));
}

#[tokio::test]
async fn startup_redrive_processes_leftover_rows() {
    let ctx = setup().await;
    // A row that was received but never routed before the crash
    {
        let store = ctx.store.lock();
        store
            .insert_inbox(milo_storage::NewInboxEntry {
                message_id: &MessageId::new("m-old"),
                session_id: &SessionId::new("s-9"),
                session_type: "bot",
                content: "finish this",
                session_name: None,
                ui_action: None,
            })
            .unwrap();
        store
            .upsert_session(&SessionId::new("s-9"), None, SessionType::Bot)
            .unwrap();
    }

    ctx.process(Event::InboxRedrive { session_id: None }).await;

    assert_eq!(ctx.workers.spawn_count(), 1);
    assert!(ctx.store.lock().get_unprocessed(10).unwrap().is_empty());
    assert_eq!(ctx.runtime.actor_queue_len(&SessionId::new("s-9")), 1);
}
