// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn install_flat_then_update_and_delete() {
    let dir = tempdir().unwrap();
    let store = FsSkillStore::new(dir.path().join("SKILLS"));

    let path = store.install("git-helper", "# Git helper", false).unwrap();
    assert_eq!(path.file_name().unwrap(), "git-helper.md");
    assert_eq!(store.installed("git-helper"), Some(path.clone()));

    store.update("git-helper", "# Git helper v2").unwrap();
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "# Git helper v2"
    );

    store.delete("git-helper").unwrap();
    assert!(store.installed("git-helper").is_none());
}

#[test]
fn bundle_layout_lives_in_a_directory() {
    let dir = tempdir().unwrap();
    let store = FsSkillStore::new(dir.path().to_path_buf());

    let path = store.install("deploy", "# Deploy", true).unwrap();
    assert!(path.ends_with("deploy/deploy.md"));
    assert_eq!(store.installed("deploy"), Some(path));

    // Delete removes the whole bundle directory
    store.delete("deploy").unwrap();
    assert!(!dir.path().join("deploy").exists());
}

#[test]
fn update_requires_existing_skill() {
    let dir = tempdir().unwrap();
    let store = FsSkillStore::new(dir.path().to_path_buf());
    let err = store.update("ghost", "content").unwrap_err();
    assert!(matches!(err, SkillStoreError::NotInstalled(_)));
}

#[test]
fn delete_missing_skill_errors() {
    let dir = tempdir().unwrap();
    let store = FsSkillStore::new(dir.path().to_path_buf());
    assert!(matches!(
        store.delete("ghost"),
        Err(SkillStoreError::NotInstalled(_))
    ));
}

#[test]
fn slugs_with_path_tricks_are_rejected() {
    let dir = tempdir().unwrap();
    let store = FsSkillStore::new(dir.path().to_path_buf());
    for slug in ["../escape", "a/b", "", "dot.dot"] {
        assert!(matches!(
            store.install(slug, "x", false),
            Err(SkillStoreError::InvalidSlug(_))
        ));
    }
}
