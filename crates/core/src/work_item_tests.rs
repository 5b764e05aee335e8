// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    cancel_word = { "cancel", WorkItemKind::Cancel },
    cancel_slash = { "/cancel", WorkItemKind::Cancel },
    cancel_trimmed = { "  CANCEL  ", WorkItemKind::Cancel },
    close_word = { "close", WorkItemKind::CloseSession },
    close_slash = { "/close", WorkItemKind::CloseSession },
    close_session = { "Close Session", WorkItemKind::CloseSession },
    status_word = { "status", WorkItemKind::StatusRequest },
    status_slash = { "/status", WorkItemKind::StatusRequest },
    models_word = { "models", WorkItemKind::ListModels },
    models_slash = { "/models", WorkItemKind::ListModels },
    plain_text = { "please cancel my subscription", WorkItemKind::UserMessage },
    empty = { "", WorkItemKind::UserMessage },
)]
fn classify_by_content(content: &str, expected: WorkItemKind) {
    assert_eq!(classify(None, content), expected);
}

#[parameterized(
    upper = { "CANCEL" },
    lower = { "cancel" },
    mixed = { "Cancel" },
)]
fn ui_action_match_is_case_insensitive(action: &str) {
    assert_eq!(classify(Some(action), "whatever"), WorkItemKind::Cancel);
}

#[test]
fn ui_action_takes_precedence_over_content() {
    assert_eq!(
        classify(Some("STATUS_REQUEST"), "cancel"),
        WorkItemKind::StatusRequest
    );
}

#[test]
fn unknown_ui_action_falls_back_to_content() {
    assert_eq!(classify(Some("DANCE"), "/models"), WorkItemKind::ListModels);
    assert_eq!(classify(Some("DANCE"), "hi"), WorkItemKind::UserMessage);
}

#[test]
fn control_kinds_are_high_priority() {
    assert_eq!(WorkItemKind::Cancel.priority(), Priority::High);
    assert_eq!(WorkItemKind::CloseSession.priority(), Priority::High);
    assert_eq!(WorkItemKind::StatusRequest.priority(), Priority::High);
    assert_eq!(WorkItemKind::ListModels.priority(), Priority::High);
    assert_eq!(WorkItemKind::UserMessage.priority(), Priority::Normal);
}

#[test]
fn inline_kinds_do_not_need_a_worker() {
    assert!(WorkItemKind::StatusRequest.is_inline());
    assert!(WorkItemKind::ListModels.is_inline());
    assert!(!WorkItemKind::Cancel.is_inline());
    assert!(!WorkItemKind::UserMessage.is_inline());
}
