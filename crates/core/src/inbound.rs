// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound message envelopes from the remote service.
//!
//! Payloads arrive either over the pub/sub command channel or from the REST
//! pending-messages poll; the shape is identical and handling converges in
//! the ingest router.

use crate::id::MessageId;
use crate::session::SessionId;
use serde::{Deserialize, Serialize};

/// A received payload, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    #[serde(rename_all = "camelCase")]
    UserMessage {
        message_id: MessageId,
        session_id: SessionId,
        session_type: String,
        content: String,
        timestamp: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ui_action: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        persona_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        persona_version_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    FormResponse {
        form_id: String,
        status: FormResponseStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        values: Option<serde_json::Value>,
    },

    #[serde(rename_all = "camelCase")]
    UiAction {
        action: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<SessionId>,
        /// Action-specific payload (e.g. skill slug and content).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<serde_json::Value>,
    },
}

/// User's verdict on a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormResponseStatus {
    Submitted,
    Cancelled,
}

/// Recognized control actions on the `ui_action` envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiActionKind {
    DeleteSession,
    /// Apply a pending self-update and restart.
    UpdateAgent,
    /// Check whether a newer daemon build is available.
    CheckUpdates,
    SkillInstall,
    SkillUpdate,
    SkillDelete,
}

impl UiActionKind {
    /// Parse an action string. Matching is case-insensitive; both the legacy
    /// `UPDATE_MILO_AGENT` tag and the newer `update_milo_agent` map to the
    /// same action.
    pub fn parse(action: &str) -> Option<Self> {
        match action.to_ascii_lowercase().as_str() {
            "delete_session" => Some(UiActionKind::DeleteSession),
            "update_milo_agent" => Some(UiActionKind::UpdateAgent),
            "check_milo_agent_updates" => Some(UiActionKind::CheckUpdates),
            "skill_install" => Some(UiActionKind::SkillInstall),
            "skill_update" => Some(UiActionKind::SkillUpdate),
            "skill_delete" => Some(UiActionKind::SkillDelete),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "inbound_tests.rs"]
mod tests;
