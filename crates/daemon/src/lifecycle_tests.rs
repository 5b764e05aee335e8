// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn config_paths_hang_off_the_state_dir() {
    let config = Config::at(PathBuf::from("/state/milo"));
    assert_eq!(config.db_path, PathBuf::from("/state/milo/milo.db"));
    assert_eq!(config.lock_path, PathBuf::from("/state/milo/milod.pid"));
    assert_eq!(config.personas_path, PathBuf::from("/state/milo/PERSONAS"));
    assert_eq!(config.skills_path, PathBuf::from("/state/milo/SKILLS"));
    assert_eq!(config.projects_path, PathBuf::from("/state/milo/PROJECTS"));
    assert_eq!(
        config.update_script_path,
        PathBuf::from("/state/milo/.update-daemon.sh")
    );
}

#[test]
fn env_file_key_parsing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(".env");

    std::fs::write(&path, "# comment\nMILO_API_KEY=sk-milo-123\nOTHER=x\n").unwrap();
    assert_eq!(read_env_file_key(&path).as_deref(), Some("sk-milo-123"));

    std::fs::write(&path, "MILO_API_KEY=\"quoted-key\"\n").unwrap();
    assert_eq!(read_env_file_key(&path).as_deref(), Some("quoted-key"));

    std::fs::write(&path, "MILO_API_KEY=\n").unwrap();
    assert_eq!(read_env_file_key(&path), None);

    assert_eq!(read_env_file_key(&dir.path().join("missing")), None);
}

#[tokio::test]
async fn startup_creates_workspace_and_takes_the_lock() {
    let dir = tempdir().unwrap();
    let config = Config::at(dir.path().join("milo"));

    let result = startup(&config).await.unwrap();

    for path in [
        &config.transcripts_path,
        &config.personas_path,
        &config.skills_path,
        &config.projects_path,
    ] {
        assert!(path.is_dir(), "{} missing", path.display());
    }
    assert!(config.db_path.exists());

    // PID file carries our pid
    let pid = std::fs::read_to_string(&config.lock_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());
    assert!(config.version_path.exists());

    // Startup queues the initial redrive
    drop(result.event_tx);
    let mut event_rx = result.event_rx;
    assert!(matches!(
        event_rx.recv().await,
        Some(Event::InboxRedrive { session_id: None })
    ));
}

#[tokio::test]
async fn second_startup_loses_the_lock_race() {
    let dir = tempdir().unwrap();
    let config = Config::at(dir.path().join("milo"));

    let _first = startup(&config).await.unwrap();
    let second = startup(&config).await;

    assert!(matches!(second, Err(LifecycleError::LockFailed(_))));
    // The running daemon's pid file is untouched
    let pid = std::fs::read_to_string(&config.lock_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());
}

#[tokio::test]
async fn leftover_update_script_is_cleaned_at_startup() {
    let dir = tempdir().unwrap();
    let config = Config::at(dir.path().join("milo"));
    std::fs::create_dir_all(&config.state_dir).unwrap();
    std::fs::write(&config.update_script_path, "#!/bin/sh\n").unwrap();

    let _result = startup(&config).await.unwrap();

    assert!(!config.update_script_path.exists());
}
