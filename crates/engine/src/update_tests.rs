// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

fn coordinator(dir: &std::path::Path) -> UpdateCoordinator {
    UpdateCoordinator::new(
        dir.join(".update-daemon.sh"),
        dir.join("update.log"),
        "1.2.3".into(),
    )
}

#[test]
fn check_reports_the_version() {
    let dir = tempdir().unwrap();
    assert_eq!(coordinator(dir.path()).check(), "milo-agent 1.2.3");
}

#[test]
fn prepare_writes_a_script_that_reexecs_this_binary() {
    let dir = tempdir().unwrap();
    let update = coordinator(dir.path());

    let path = update.prepare().unwrap();
    let script = std::fs::read_to_string(&path).unwrap();
    assert!(script.starts_with("#!/bin/sh"));
    let exe = std::env::current_exe().unwrap();
    assert!(script.contains(&format!("exec {}", exe.display())));
}

#[test]
fn cleanup_removes_a_leftover_script() {
    let dir = tempdir().unwrap();
    let update = coordinator(dir.path());
    update.prepare().unwrap();
    assert!(dir.path().join(".update-daemon.sh").exists());

    update.cleanup();
    assert!(!dir.path().join(".update-daemon.sh").exists());

    // Idempotent
    update.cleanup();
}
