// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn user_message_parses_with_optional_fields_absent() {
    let raw = r#"{
        "type": "user_message",
        "messageId": "m-1",
        "sessionId": "s-1",
        "sessionType": "bot",
        "content": "hi",
        "timestamp": "2026-01-01T00:00:00Z"
    }"#;
    let msg: Inbound = serde_json::from_str(raw).unwrap();
    match msg {
        Inbound::UserMessage {
            message_id,
            session_id,
            ui_action,
            model,
            ..
        } => {
            assert_eq!(message_id, "m-1");
            assert_eq!(session_id, "s-1");
            assert!(ui_action.is_none());
            assert!(model.is_none());
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn user_message_carries_persona_and_model() {
    let raw = r#"{
        "type": "user_message",
        "messageId": "m-2",
        "sessionId": "s-1",
        "sessionType": "chat",
        "content": "hi",
        "timestamp": "2026-01-01T00:00:00Z",
        "personaId": "helper",
        "personaVersionId": "v2",
        "model": "fast",
        "uiAction": "CANCEL"
    }"#;
    let msg: Inbound = serde_json::from_str(raw).unwrap();
    match msg {
        Inbound::UserMessage {
            persona_id,
            persona_version_id,
            model,
            ui_action,
            ..
        } => {
            assert_eq!(persona_id.as_deref(), Some("helper"));
            assert_eq!(persona_version_id.as_deref(), Some("v2"));
            assert_eq!(model.as_deref(), Some("fast"));
            assert_eq!(ui_action.as_deref(), Some("CANCEL"));
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn form_response_parses() {
    let raw = r#"{"type":"form_response","formId":"f-9","status":"cancelled"}"#;
    let msg: Inbound = serde_json::from_str(raw).unwrap();
    assert_eq!(
        msg,
        Inbound::FormResponse {
            form_id: "f-9".into(),
            status: FormResponseStatus::Cancelled,
            values: None,
        }
    );
}

#[test]
fn ui_action_parses_with_session() {
    let raw = r#"{"type":"ui_action","action":"DELETE_SESSION","sessionId":"s-3"}"#;
    let msg: Inbound = serde_json::from_str(raw).unwrap();
    match msg {
        Inbound::UiAction {
            action, session_id, ..
        } => {
            assert_eq!(action, "DELETE_SESSION");
            assert_eq!(session_id, Some(SessionId::new("s-3")));
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[parameterized(
    delete = { "DELETE_SESSION", UiActionKind::DeleteSession },
    update_legacy = { "UPDATE_MILO_AGENT", UiActionKind::UpdateAgent },
    update = { "update_milo_agent", UiActionKind::UpdateAgent },
    check = { "check_milo_agent_updates", UiActionKind::CheckUpdates },
    skill_install = { "skill_install", UiActionKind::SkillInstall },
    skill_update = { "skill_update", UiActionKind::SkillUpdate },
    skill_delete = { "skill_delete", UiActionKind::SkillDelete },
)]
fn ui_action_kind_parses(action: &str, expected: UiActionKind) {
    assert_eq!(UiActionKind::parse(action), Some(expected));
}

#[test]
fn unknown_ui_action_kind_is_none() {
    assert_eq!(UiActionKind::parse("DO_A_FLIP"), None);
}
