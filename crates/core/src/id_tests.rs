// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::session::SessionId;

#[test]
fn uuid_generator_produces_unique_ids() {
    let gen = UuidIdGen;
    let a = gen.next();
    let b = gen.next();
    assert_ne!(a, b);
    assert_eq!(a.len(), 36);
}

#[test]
fn sequential_generator_counts_up() {
    let gen = SequentialIdGen::new("msg");
    assert_eq!(gen.next(), "msg-1");
    assert_eq!(gen.next(), "msg-2");
    assert_eq!(gen.next(), "msg-3");
}

#[test]
fn sequential_generator_clones_share_counter() {
    let gen = SequentialIdGen::new("t");
    let clone = gen.clone();
    assert_eq!(gen.next(), "t-1");
    assert_eq!(clone.next(), "t-2");
}

#[test]
fn short_truncates_long_ids() {
    let id = MessageId::new("0123456789abcdef");
    assert_eq!(id.short(8), "01234567");
    assert_eq!(id.short(100), "0123456789abcdef");
}

#[test]
fn short_id_on_str() {
    assert_eq!("hello".short(3), "hel");
    assert_eq!("hi".short(3), "hi");
}

#[test]
fn id_equality_against_str() {
    let id = SessionId::new("s-1");
    assert_eq!(id, "s-1");
    assert_eq!(id.as_str(), "s-1");
    assert_eq!(id.to_string(), "s-1");
}

#[test]
fn id_serializes_as_plain_string() {
    let id = TaskId::new("task-9");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"task-9\"");
    let back: TaskId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}
