// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound event payloads published to the pub/sub event channel and
//! persisted to the outbox for REST delivery.
//!
//! The outbox copy is the source of truth; the pub/sub copy is a
//! low-latency accelerator and may be lost without consequence.

use crate::id::MessageId;
use crate::session::{SessionId, SessionStatus};
use serde::{Deserialize, Serialize};

/// Event payload published on the event channel, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    #[serde(rename_all = "camelCase")]
    AgentMessage {
        session_id: SessionId,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context_size: Option<u64>,
    },

    /// Short status line not tied to a session reply.
    AgentStatus { content: String },

    #[serde(rename_all = "camelCase")]
    SessionUpdate {
        session_id: SessionId,
        session_status: SessionStatus,
    },

    #[serde(rename_all = "camelCase")]
    SessionStatusChanged {
        session_id: SessionId,
        session_status: SessionStatus,
    },

    #[serde(rename_all = "camelCase")]
    ToolUse {
        session_id: SessionId,
        tool: String,
        /// "start" or "end".
        phase: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ok: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    FileSend {
        session_id: SessionId,
        file_name: String,
        file_contents: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    FormRequest {
        session_id: SessionId,
        form_id: String,
        form: serde_json::Value,
    },

    ModelsList { models: Vec<ModelInfo> },

    #[serde(rename_all = "camelCase")]
    UiActionResult {
        action: String,
        ok: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },

    Error { message: String },
}

impl EventPayload {
    /// Session this event belongs to, when it has one.
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            EventPayload::AgentMessage { session_id, .. }
            | EventPayload::SessionUpdate { session_id, .. }
            | EventPayload::SessionStatusChanged { session_id, .. }
            | EventPayload::ToolUse { session_id, .. }
            | EventPayload::FileSend { session_id, .. }
            | EventPayload::FormRequest { session_id, .. } => Some(session_id),
            _ => None,
        }
    }
}

/// One entry of the curated model catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub default: bool,
}

/// A published event: the payload stamped with agent identity and time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub agent_id: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub payload: EventPayload,
}

/// Durable outbox entry kinds, matching their REST destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxKind {
    /// `POST /messages/ack`
    AckMessage,
    /// `POST /messages/send`
    SendMessage,
}

impl OutboxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxKind::AckMessage => "ack_message",
            OutboxKind::SendMessage => "send_message",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ack_message" => Some(OutboxKind::AckMessage),
            "send_message" => Some(OutboxKind::SendMessage),
            _ => None,
        }
    }
}

/// Payload of an `ack_message` outbox entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckPayload {
    pub message_ids: Vec<MessageId>,
}

/// Payload of a `send_message` outbox entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPayload {
    pub session_id: SessionId,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_data: Option<serde_json::Value>,
}

#[cfg(test)]
#[path = "outbound_tests.rs"]
mod tests;
