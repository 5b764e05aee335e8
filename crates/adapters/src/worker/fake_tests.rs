// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use milo_core::{SessionSpec, SessionType};
use std::path::PathBuf;

fn config(session_id: &SessionId) -> WorkerSpawnConfig {
    WorkerSpawnConfig {
        session_id: session_id.clone(),
        worker_bin: PathBuf::from("/bin/true"),
        args: vec![],
        cwd: PathBuf::from("/tmp"),
        env: vec![],
        init: SupervisorMsg::WorkerInit {
            session_id: session_id.clone(),
            session_name: None,
            spec: SessionSpec::new(SessionType::Bot),
            project_path: None,
            workspace_path: PathBuf::from("/tmp"),
            history: vec![],
            settings: serde_json::Value::Null,
        },
    }
}

#[tokio::test]
async fn spawn_records_init_as_first_sent_message() {
    let adapter = FakeWorkerAdapter::new();
    let sid = SessionId::new("s-1");
    let (tx, _rx) = mpsc::channel(8);

    let handle = adapter.spawn(config(&sid), tx).await.unwrap();
    assert!(adapter.is_pid_alive(handle.pid));

    let sent = adapter.sent(&sid);
    assert_eq!(sent.len(), 1);
    assert!(matches!(sent[0], SupervisorMsg::WorkerInit { .. }));
}

#[tokio::test]
async fn emit_delivers_to_the_spawn_channel() {
    let adapter = FakeWorkerAdapter::new();
    let sid = SessionId::new("s-1");
    let (tx, mut rx) = mpsc::channel(8);
    adapter.spawn(config(&sid), tx).await.unwrap();

    adapter.emit(&sid, WorkerMsg::WorkerReady).await;

    match rx.recv().await.unwrap() {
        Event::WorkerEvent {
            msg: WorkerMsg::WorkerReady,
            ..
        } => {}
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn emit_exit_kills_the_pid() {
    let adapter = FakeWorkerAdapter::new();
    let sid = SessionId::new("s-1");
    let (tx, mut rx) = mpsc::channel(8);
    let handle = adapter.spawn(config(&sid), tx).await.unwrap();

    adapter.emit_exit(&sid, Some(1)).await;

    assert!(!adapter.is_pid_alive(handle.pid));
    match rx.recv().await.unwrap() {
        Event::WorkerExited { exit_code, .. } => assert_eq!(exit_code, Some(1)),
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn scripted_spawn_error_fires_once() {
    let adapter = FakeWorkerAdapter::new();
    let sid = SessionId::new("s-1");
    adapter.set_spawn_error(WorkerAdapterError::SpawnFailed("nope".into()));

    let (tx, _rx) = mpsc::channel(8);
    assert!(adapter.spawn(config(&sid), tx.clone()).await.is_err());
    assert!(adapter.spawn(config(&sid), tx).await.is_ok());
}

#[tokio::test]
async fn send_to_missing_worker_errors() {
    let adapter = FakeWorkerAdapter::new();
    let err = adapter
        .send(&SessionId::new("ghost"), &SupervisorMsg::WorkerClose)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerAdapterError::NotFound(_)));
}
