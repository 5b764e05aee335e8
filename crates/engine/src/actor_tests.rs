// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use milo_core::{WorkItemId, WorkItemKind};

fn item(id: &str, kind: WorkItemKind) -> WorkItem {
    WorkItem {
        id: WorkItemId::new(id),
        kind,
        message_id: MessageId::new(format!("m-{}", id)),
        content: String::new(),
        persona: None,
        model: None,
    }
}

fn actor() -> SessionActor {
    SessionActor::new(SessionId::new("s-1"), SessionType::Bot)
}

#[test]
fn high_drains_before_normal() {
    let mut actor = actor();
    actor.push(item("u1", WorkItemKind::UserMessage));
    actor.push(item("c1", WorkItemKind::Cancel));
    actor.push(item("u2", WorkItemKind::UserMessage));
    actor.push(item("x1", WorkItemKind::CloseSession));

    let order: Vec<String> = std::iter::from_fn(|| actor.pop_next())
        .map(|i| i.id.to_string())
        .collect();
    assert_eq!(order, ["c1", "x1", "u1", "u2"]);
}

#[test]
fn push_front_returns_item_first_in_its_tier() {
    let mut actor = actor();
    actor.push(item("u1", WorkItemKind::UserMessage));
    actor.push(item("u2", WorkItemKind::UserMessage));

    let popped = actor.pop_next().unwrap();
    actor.push_front(popped);

    assert_eq!(actor.pop_next().unwrap().id, "u1");
}

#[test]
fn drain_high_keeps_user_messages() {
    let mut actor = actor();
    actor.push(item("c1", WorkItemKind::Cancel));
    actor.push(item("u1", WorkItemKind::UserMessage));
    actor.push(item("x1", WorkItemKind::CloseSession));

    assert_eq!(actor.drain_high(), 2);
    assert_eq!(actor.queued(), 1);
    assert_eq!(actor.pop_next().unwrap().id, "u1");
}

#[test]
fn drain_all_empties_both_tiers() {
    let mut actor = actor();
    actor.push(item("c1", WorkItemKind::Cancel));
    actor.push(item("u1", WorkItemKind::UserMessage));
    assert_eq!(actor.drain_all(), 2);
    assert!(!actor.has_queued());
}

#[test]
fn derived_status_tracks_state() {
    let mut actor = actor();
    assert_eq!(actor.derived_status(), SessionStatus::OpenIdle);

    actor.state = ActorState::Running;
    assert_eq!(actor.derived_status(), SessionStatus::OpenRunning);

    actor.state = ActorState::WaitingUser;
    actor.pending_question = Some("tc-1".into());
    assert_eq!(actor.derived_status(), SessionStatus::OpenWaitingUser);

    actor.pending_question = None;
    actor.pending_form = Some("f-1".into());
    assert_eq!(actor.derived_status(), SessionStatus::OpenInputRequired);

    actor.state = ActorState::Dead;
    assert_eq!(actor.derived_status(), SessionStatus::OpenIdle);
}

#[test]
fn live_worker_requires_pid_and_non_dead_state() {
    let mut actor = actor();
    assert!(!actor.has_live_worker());

    actor.worker_pid = Some(1234);
    actor.state = ActorState::Idle;
    assert!(actor.has_live_worker());

    actor.state = ActorState::Dead;
    assert!(!actor.has_live_worker());
}
