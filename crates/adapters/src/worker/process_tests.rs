// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use milo_core::{SessionSpec, SessionType, WorkerMsg};
use std::path::PathBuf;
use std::time::Duration;

fn init_msg(session_id: &SessionId) -> SupervisorMsg {
    SupervisorMsg::WorkerInit {
        session_id: session_id.clone(),
        session_name: None,
        spec: SessionSpec::new(SessionType::Bot),
        project_path: None,
        workspace_path: PathBuf::from("/tmp"),
        history: vec![],
        settings: serde_json::Value::Null,
    }
}

/// Worker stand-in: reads the init line, emits READY, exits cleanly.
fn echo_ready_config(session_id: &SessionId) -> WorkerSpawnConfig {
    WorkerSpawnConfig {
        session_id: session_id.clone(),
        worker_bin: PathBuf::from("/bin/sh"),
        args: vec![
            "-c".into(),
            r#"read line; echo '{"type":"WORKER_READY"}'"#.into(),
        ],
        cwd: PathBuf::from("/tmp"),
        env: vec![],
        init: init_msg(session_id),
    }
}

async fn recv_with_timeout(rx: &mut mpsc::Receiver<Event>) -> Event {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

#[tokio::test]
async fn spawn_reads_ready_then_reports_exit() {
    let adapter = ProcessWorkerAdapter::new();
    let sid = SessionId::new("s-1");
    let (tx, mut rx) = mpsc::channel(16);

    let handle = adapter.spawn(echo_ready_config(&sid), tx).await.unwrap();
    assert_eq!(handle.session_id, sid);
    assert!(handle.pid > 0);

    match recv_with_timeout(&mut rx).await {
        Event::WorkerEvent {
            session_id,
            msg: WorkerMsg::WorkerReady,
        } => assert_eq!(session_id, sid),
        other => panic!("expected ready, got {:?}", other),
    }

    match recv_with_timeout(&mut rx).await {
        Event::WorkerExited {
            session_id,
            exit_code,
        } => {
            assert_eq!(session_id, sid);
            assert_eq!(exit_code, Some(0));
        }
        other => panic!("expected exit, got {:?}", other),
    }
}

#[tokio::test]
async fn malformed_and_unknown_lines_are_dropped() {
    let adapter = ProcessWorkerAdapter::new();
    let sid = SessionId::new("s-2");
    let (tx, mut rx) = mpsc::channel(16);

    let mut config = echo_ready_config(&sid);
    config.args = vec![
        "-c".into(),
        concat!(
            "read line; ",
            "echo 'not json'; ",
            r#"echo '{"type":"WORKER_DISCO"}'; "#,
            r#"echo '{"type":"WORKER_PROGRESS","status":"working"}'"#,
        )
        .into(),
    ];

    adapter.spawn(config, tx).await.unwrap();

    // The two bad lines never surface; the good one does.
    match recv_with_timeout(&mut rx).await {
        Event::WorkerEvent {
            msg: WorkerMsg::WorkerProgress { status },
            ..
        } => assert_eq!(status, "working"),
        other => panic!("expected progress, got {:?}", other),
    }
}

#[tokio::test]
async fn send_writes_lines_the_worker_sees() {
    let adapter = ProcessWorkerAdapter::new();
    let sid = SessionId::new("s-3");
    let (tx, mut rx) = mpsc::channel(16);

    // Worker echoes back the type of every message it reads as progress.
    let mut config = echo_ready_config(&sid);
    config.args = vec![
        "-c".into(),
        concat!(
            "read line; ",
            r#"echo '{"type":"WORKER_READY"}'; "#,
            "read line2; ",
            r#"echo "{\"type\":\"WORKER_PROGRESS\",\"status\":\"got-input\"}""#,
        )
        .into(),
    ];

    adapter.spawn(config, tx).await.unwrap();

    match recv_with_timeout(&mut rx).await {
        Event::WorkerEvent {
            msg: WorkerMsg::WorkerReady,
            ..
        } => {}
        other => panic!("expected ready, got {:?}", other),
    }

    adapter
        .send(&sid, &SupervisorMsg::WorkerClose)
        .await
        .unwrap();

    match recv_with_timeout(&mut rx).await {
        Event::WorkerEvent {
            msg: WorkerMsg::WorkerProgress { status },
            ..
        } => assert_eq!(status, "got-input"),
        other => panic!("expected progress, got {:?}", other),
    }
}

#[tokio::test]
async fn send_to_unknown_session_is_not_found() {
    let adapter = ProcessWorkerAdapter::new();
    let err = adapter
        .send(&SessionId::new("ghost"), &SupervisorMsg::WorkerClose)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerAdapterError::NotFound(_)));
}

#[tokio::test]
async fn spawn_fails_for_missing_cwd() {
    let adapter = ProcessWorkerAdapter::new();
    let sid = SessionId::new("s-4");
    let mut config = echo_ready_config(&sid);
    config.cwd = PathBuf::from("/definitely/not/a/dir");
    let (tx, _rx) = mpsc::channel(16);

    let err = adapter.spawn(config, tx).await.unwrap_err();
    assert!(matches!(err, WorkerAdapterError::SpawnFailed(_)));
}

#[tokio::test]
async fn kill_ends_a_stubborn_worker() {
    let adapter = ProcessWorkerAdapter::new();
    let sid = SessionId::new("s-5");
    let (tx, mut rx) = mpsc::channel(16);

    // Ignores SIGTERM-able niceties by sleeping forever
    let mut config = echo_ready_config(&sid);
    config.args = vec!["-c".into(), "read line; sleep 300".into()];

    let handle = adapter.spawn(config, tx).await.unwrap();
    assert!(adapter.is_pid_alive(handle.pid));

    adapter.kill(&sid).await.unwrap();

    match recv_with_timeout(&mut rx).await {
        Event::WorkerExited { exit_code, .. } => {
            // Killed by signal: no exit code
            assert_eq!(exit_code, None);
        }
        other => panic!("expected exit, got {:?}", other),
    }
}

#[test]
fn pid_probe_detects_dead_pids() {
    let adapter = ProcessWorkerAdapter::new();
    // Our own pid is alive
    assert!(adapter.is_pid_alive(std::process::id()));
    // A pid far beyond any configured pid_max is not
    assert!(!adapter.is_pid_alive(i32::MAX as u32 - 16));
}
