// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::session::SessionType;

#[test]
fn init_is_tagged_screaming_snake() {
    let msg = SupervisorMsg::WorkerInit {
        session_id: SessionId::new("s-1"),
        session_name: Some("demo".into()),
        spec: SessionSpec::new(SessionType::Bot),
        project_path: None,
        workspace_path: PathBuf::from("/work"),
        history: vec![],
        settings: serde_json::Value::Null,
    };
    let json: serde_json::Value = serde_json::from_str(&encode_line(&msg).unwrap()).unwrap();
    assert_eq!(json["type"], "WORKER_INIT");
    assert_eq!(json["sessionId"], "s-1");
    assert_eq!(json["workspacePath"], "/work");
    // Empty/None fields stay off the wire
    assert!(json.get("history").is_none());
    assert!(json.get("projectPath").is_none());
    assert!(json.get("settings").is_none());
}

#[test]
fn answer_uses_camel_case_fields() {
    let msg = SupervisorMsg::WorkerAnswer {
        tool_call_id: "tc-7".into(),
        answer: "yes".into(),
    };
    let json: serde_json::Value = serde_json::from_str(&encode_line(&msg).unwrap()).unwrap();
    assert_eq!(json["type"], "WORKER_ANSWER");
    assert_eq!(json["toolCallId"], "tc-7");
    assert_eq!(json["answer"], "yes");
}

#[test]
fn parse_ready_line() {
    match parse_worker_line(r#"{"type":"WORKER_READY"}"#) {
        LineParse::Message(WorkerMsg::WorkerReady) => {}
        other => panic!("unexpected parse: {:?}", other),
    }
}

#[test]
fn parse_question_line() {
    let line = r#"{"type":"WORKER_QUESTION","toolCallId":"tc-7","question":"Overwrite?"}"#;
    match parse_worker_line(line) {
        LineParse::Message(WorkerMsg::WorkerQuestion {
            tool_call_id,
            question,
        }) => {
            assert_eq!(tool_call_id, "tc-7");
            assert_eq!(question, "Overwrite?");
        }
        other => panic!("unexpected parse: {:?}", other),
    }
}

#[test]
fn parse_error_defaults_fatal_to_false() {
    let line = r#"{"type":"WORKER_ERROR","message":"tool refused"}"#;
    match parse_worker_line(line) {
        LineParse::Message(WorkerMsg::WorkerError { message, fatal }) => {
            assert_eq!(message, "tool refused");
            assert!(!fatal);
        }
        other => panic!("unexpected parse: {:?}", other),
    }
}

#[test]
fn unknown_type_is_distinguished_from_malformed() {
    match parse_worker_line(r#"{"type":"WORKER_DANCE"}"#) {
        LineParse::UnknownType(kind) => assert_eq!(kind, "WORKER_DANCE"),
        other => panic!("unexpected parse: {:?}", other),
    }
}

#[test]
fn garbage_is_malformed() {
    assert!(matches!(
        parse_worker_line("not json at all"),
        LineParse::Malformed(_)
    ));
}

#[test]
fn known_type_with_bad_shape_is_malformed() {
    // WORKER_TASK_DONE requires taskId
    assert!(matches!(
        parse_worker_line(r#"{"type":"WORKER_TASK_DONE"}"#),
        LineParse::Malformed(_)
    ));
}

#[test]
fn form_response_status_serializes_lowercase() {
    let msg = SupervisorMsg::WorkerFormResponse {
        form_id: "f-1".into(),
        status: FormStatus::Submitted,
        values: Some(serde_json::json!({"name": "x"})),
    };
    let json: serde_json::Value = serde_json::from_str(&encode_line(&msg).unwrap()).unwrap();
    assert_eq!(json["status"], "submitted");
    assert_eq!(json["formId"], "f-1");
}

#[test]
fn worker_msg_round_trips() {
    let msg = WorkerMsg::WorkerTaskDone {
        task_id: TaskId::new("t-1"),
        summary: Some("done".into()),
        context_size: Some(4096),
    };
    let line = serde_json::to_string(&msg).unwrap();
    match parse_worker_line(&line) {
        LineParse::Message(back) => assert_eq!(back, msg),
        other => panic!("unexpected parse: {:?}", other),
    }
}
