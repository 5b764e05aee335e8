// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work items queued on a session actor, and their classification.

use crate::id::{MessageId, WorkItemId};
use crate::session::PersonaRef;
use serde::{Deserialize, Serialize};

/// Kind of work a routed message asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkItemKind {
    UserMessage,
    Cancel,
    CloseSession,
    StatusRequest,
    ListModels,
}

impl WorkItemKind {
    /// Control kinds jump the queue; user messages wait their turn.
    pub fn priority(&self) -> Priority {
        match self {
            WorkItemKind::UserMessage => Priority::Normal,
            _ => Priority::High,
        }
    }

    /// Kinds answered inline by the router, without a worker.
    pub fn is_inline(&self) -> bool {
        matches!(self, WorkItemKind::StatusRequest | WorkItemKind::ListModels)
    }
}

/// Dispatch priority of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Normal,
}

/// A unit of queued work on a session actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    pub kind: WorkItemKind,
    /// The inbound message this item originated from.
    pub message_id: MessageId,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<PersonaRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl WorkItem {
    pub fn priority(&self) -> Priority {
        self.kind.priority()
    }
}

/// Classify a message into a work item kind.
///
/// The structured `uiAction` tag wins when present (case-insensitive).
/// Otherwise the trimmed, lower-cased content is matched against the short
/// command vocabulary. Anything else is a user message.
pub fn classify(ui_action: Option<&str>, content: &str) -> WorkItemKind {
    if let Some(action) = ui_action {
        match action.to_ascii_uppercase().as_str() {
            "CANCEL" => return WorkItemKind::Cancel,
            "CLOSE_SESSION" => return WorkItemKind::CloseSession,
            "STATUS_REQUEST" => return WorkItemKind::StatusRequest,
            "LIST_MODELS" => return WorkItemKind::ListModels,
            _ => {}
        }
    }

    match content.trim().to_lowercase().as_str() {
        "cancel" | "/cancel" => WorkItemKind::Cancel,
        "close" | "/close" | "close session" => WorkItemKind::CloseSession,
        "status" | "/status" => WorkItemKind::StatusRequest,
        "models" | "/models" => WorkItemKind::ListModels,
        _ => WorkItemKind::UserMessage,
    }
}

#[cfg(test)]
#[path = "work_item_tests.rs"]
mod tests;
