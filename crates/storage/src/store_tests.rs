// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn open_creates_parent_directories_and_schema() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state/milo.db");
    let store = Store::open(&path).unwrap();
    assert!(path.exists());

    // Schema is usable immediately
    let unsent = store.get_unsent(10, 10).unwrap();
    assert!(unsent.is_empty());
}

#[test]
fn reopen_preserves_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("milo.db");

    {
        let store = Store::open(&path).unwrap();
        store
            .enqueue_outbox(milo_core::OutboxKind::AckMessage, "{}", None)
            .unwrap();
    }

    let store = Store::open(&path).unwrap();
    let unsent = store.get_unsent(10, 10).unwrap();
    assert_eq!(unsent.len(), 1);
}
