// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn envelope_flattens_payload() {
    let env = Envelope {
        agent_id: "milo".into(),
        timestamp: "2026-01-01T00:00:00Z".into(),
        payload: EventPayload::AgentMessage {
            session_id: SessionId::new("s-1"),
            content: "done".into(),
            context_size: Some(2048),
        },
    };
    let json = serde_json::to_value(&env).unwrap();
    assert_eq!(json["type"], "agent_message");
    assert_eq!(json["agentId"], "milo");
    assert_eq!(json["sessionId"], "s-1");
    assert_eq!(json["contextSize"], 2048);
}

#[test]
fn session_status_rides_in_wire_form() {
    let payload = EventPayload::SessionStatusChanged {
        session_id: SessionId::new("s-1"),
        session_status: SessionStatus::OpenWaitingUser,
    };
    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["sessionStatus"], "OPEN_WAITING_USER");
}

#[test]
fn payload_session_id_accessor() {
    let with = EventPayload::ToolUse {
        session_id: SessionId::new("s-2"),
        tool: "shell".into(),
        phase: "start".into(),
        ok: None,
        detail: None,
    };
    assert_eq!(with.session_id().map(|s| s.as_str()), Some("s-2"));

    let without = EventPayload::AgentStatus {
        content: "idle".into(),
    };
    assert!(without.session_id().is_none());
}

#[test]
fn outbox_kind_round_trips() {
    assert_eq!(
        OutboxKind::parse(OutboxKind::AckMessage.as_str()),
        Some(OutboxKind::AckMessage)
    );
    assert_eq!(
        OutboxKind::parse(OutboxKind::SendMessage.as_str()),
        Some(OutboxKind::SendMessage)
    );
    assert_eq!(OutboxKind::parse("broadcast"), None);
}

#[test]
fn send_payload_omits_absent_blobs() {
    let payload = SendPayload {
        session_id: SessionId::new("s-3"),
        content: "hi".into(),
        form_data: None,
        file_data: None,
    };
    let json = serde_json::to_value(&payload).unwrap();
    assert!(json.get("formData").is_none());
    assert!(json.get("fileData").is_none());

    let back: SendPayload = serde_json::from_value(json).unwrap();
    assert_eq!(back, payload);
}

#[test]
fn ack_payload_lists_message_ids() {
    let payload = AckPayload {
        message_ids: vec![MessageId::new("m-1"), MessageId::new("m-2")],
    };
    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["messageIds"][1], "m-2");
}
