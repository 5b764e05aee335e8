// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persona cache: Markdown persona definitions under `PERSONAS/`.
//!
//! Files are named `{personaId}--{personaVersionId}.md` and populated by
//! the setup tooling. The daemon only resolves them; a miss is logged and
//! the task proceeds without a persona.

use milo_core::PersonaRef;
use std::path::{Path, PathBuf};

/// Read-side view of the persona cache directory.
#[derive(Clone)]
pub struct PersonaCache {
    root: PathBuf,
}

impl PersonaCache {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Cache file path for a persona version.
    pub fn path_for(&self, persona: &PersonaRef) -> PathBuf {
        self.root.join(persona.file_name())
    }

    /// Load the persona body, if cached.
    pub fn load(&self, persona: &PersonaRef) -> Option<String> {
        let path = self.path_for(persona);
        match std::fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(_) => {
                tracing::warn!(
                    persona_id = %persona.persona_id,
                    persona_version_id = %persona.persona_version_id,
                    path = %path.display(),
                    "persona not in cache"
                );
                None
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
#[path = "personas_tests.rs"]
mod tests;
