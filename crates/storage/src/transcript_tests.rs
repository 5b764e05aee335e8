// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn append_creates_file_and_accumulates() {
    let dir = tempdir().unwrap();
    let writer = TranscriptWriter::new(dir.path().join("transcripts"));
    let sid = SessionId::new("s-1");

    writer.append(&sid, "user", "hi");
    writer.append(&sid, "agent", "hello!");

    let content = std::fs::read_to_string(writer.path_for(&sid)).unwrap();
    assert!(content.contains("**user**"));
    assert!(content.contains("hi"));
    assert!(content.contains("**agent**"));
    assert!(content.contains("hello!"));
    let user_pos = content.find("**user**").unwrap();
    let agent_pos = content.find("**agent**").unwrap();
    assert!(user_pos < agent_pos);
}

#[test]
fn unsafe_session_id_characters_are_sanitized() {
    let dir = tempdir().unwrap();
    let writer = TranscriptWriter::new(dir.path().to_path_buf());
    let sid = SessionId::new("../etc/passwd");

    let path = writer.path_for(&sid);
    assert!(path.starts_with(dir.path()));
    assert_eq!(path.file_name().unwrap(), "---etc-passwd.md");
}

#[test]
fn sessions_get_separate_files() {
    let dir = tempdir().unwrap();
    let writer = TranscriptWriter::new(dir.path().to_path_buf());
    writer.append(&SessionId::new("s-1"), "user", "one");
    writer.append(&SessionId::new("s-2"), "user", "two");

    assert_ne!(
        writer.path_for(&SessionId::new("s-1")),
        writer.path_for(&SessionId::new("s-2"))
    );
    assert!(writer.path_for(&SessionId::new("s-1")).exists());
    assert!(writer.path_for(&SessionId::new("s-2")).exists());
}
