// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Curated model catalog, answered inline for `LIST_MODELS` requests.
//!
//! Owned by the orchestrator root and passed down, so tests construct their
//! own instead of sharing process-wide state.

use milo_core::ModelInfo;

/// The models users may pick per message.
#[derive(Clone)]
pub struct ModelCatalog {
    models: Vec<ModelInfo>,
}

impl ModelCatalog {
    pub fn new(models: Vec<ModelInfo>) -> Self {
        Self { models }
    }

    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    /// Whether an override names a known model.
    pub fn contains(&self, id: &str) -> bool {
        self.models.iter().any(|m| m.id == id)
    }

    /// Plain-text rendering for the durable reply.
    pub fn as_text(&self) -> String {
        let mut out = String::from("Available models:");
        for model in &self.models {
            out.push_str("\n- ");
            out.push_str(&model.id);
            out.push_str(" (");
            out.push_str(&model.label);
            if model.default {
                out.push_str(", default");
            }
            out.push(')');
        }
        out
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::new(vec![
            ModelInfo {
                id: "balanced".into(),
                label: "Balanced".into(),
                default: true,
            },
            ModelInfo {
                id: "fast".into(),
                label: "Fast".into(),
                default: false,
            },
            ModelInfo {
                id: "deep".into(),
                label: "Deep reasoning".into(),
                default: false,
            },
        ])
    }
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
