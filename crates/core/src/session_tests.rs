// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    open_idle = { SessionStatus::OpenIdle, "OPEN_IDLE" },
    open_running = { SessionStatus::OpenRunning, "OPEN_RUNNING" },
    open_waiting = { SessionStatus::OpenWaitingUser, "OPEN_WAITING_USER" },
    input_required = { SessionStatus::OpenInputRequired, "OPEN_INPUT_REQUIRED" },
    paused = { SessionStatus::OpenPaused, "OPEN_PAUSED" },
    closed = { SessionStatus::Closed, "CLOSED" },
    errored = { SessionStatus::Errored, "ERRORED" },
)]
fn status_round_trips_through_text(status: SessionStatus, text: &str) {
    assert_eq!(status.as_str(), text);
    assert_eq!(SessionStatus::parse(text), Some(status));
}

#[test]
fn status_parse_rejects_unknown() {
    assert_eq!(SessionStatus::parse("OPEN"), None);
}

#[test]
fn only_closed_is_inactive() {
    assert!(!SessionStatus::Closed.is_active());
    assert!(SessionStatus::OpenIdle.is_active());
    assert!(SessionStatus::Errored.is_active());
}

#[test]
fn session_type_defaults_to_bot_on_unknown() {
    assert_eq!(SessionType::parse("chat"), SessionType::Chat);
    assert_eq!(SessionType::parse("bot"), SessionType::Bot);
    assert_eq!(SessionType::parse("weird"), SessionType::Bot);
}

#[test]
fn worker_state_round_trips() {
    for state in [
        WorkerState::Starting,
        WorkerState::Ready,
        WorkerState::Busy,
        WorkerState::Dead,
    ] {
        assert_eq!(WorkerState::parse(state.as_str()), Some(state));
    }
}

#[test]
fn persona_file_name_format() {
    let persona = PersonaRef {
        persona_id: "helper".into(),
        persona_version_id: "v3".into(),
    };
    assert_eq!(persona.file_name(), "helper--v3.md");
}

#[test]
fn session_spec_serializes_camel_case() {
    let mut spec = SessionSpec::new(SessionType::Bot);
    spec.model = Some("fast".into());
    let json = serde_json::to_value(&spec).unwrap();
    assert_eq!(json["sessionType"], "bot");
    assert_eq!(json["model"], "fast");
    assert!(json.get("persona").is_none());
}
