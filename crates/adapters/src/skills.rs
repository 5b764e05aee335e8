// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Skill store: Markdown skill files under the workspace `SKILLS/` tree.
//!
//! Two layouts exist side by side: a single `{slug}.md` file, or a
//! `{slug}/{slug}.md` bundle directory for skills that ship extra assets.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SkillStoreError {
    #[error("skill not installed: {0}")]
    NotInstalled(String),

    #[error("invalid skill slug: {0}")]
    InvalidSlug(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Filesystem-backed skill store.
#[derive(Clone)]
pub struct FsSkillStore {
    root: PathBuf,
}

impl FsSkillStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Install (or overwrite) a skill. `bundle` selects the directory layout.
    pub fn install(
        &self,
        slug: &str,
        content: &str,
        bundle: bool,
    ) -> Result<PathBuf, SkillStoreError> {
        validate_slug(slug)?;
        let path = if bundle {
            let dir = self.root.join(slug);
            std::fs::create_dir_all(&dir)?;
            dir.join(format!("{}.md", slug))
        } else {
            std::fs::create_dir_all(&self.root)?;
            self.root.join(format!("{}.md", slug))
        };
        std::fs::write(&path, content)?;
        tracing::info!(slug, path = %path.display(), "skill installed");
        Ok(path)
    }

    /// Overwrite an installed skill, preserving its current layout.
    pub fn update(&self, slug: &str, content: &str) -> Result<PathBuf, SkillStoreError> {
        validate_slug(slug)?;
        let path = self
            .installed(slug)
            .ok_or_else(|| SkillStoreError::NotInstalled(slug.to_string()))?;
        std::fs::write(&path, content)?;
        tracing::info!(slug, path = %path.display(), "skill updated");
        Ok(path)
    }

    /// Remove a skill in either layout. Bundles are deleted whole.
    pub fn delete(&self, slug: &str) -> Result<(), SkillStoreError> {
        validate_slug(slug)?;
        let flat = self.root.join(format!("{}.md", slug));
        let dir = self.root.join(slug);
        if flat.exists() {
            std::fs::remove_file(&flat)?;
        } else if dir.is_dir() {
            std::fs::remove_dir_all(&dir)?;
        } else {
            return Err(SkillStoreError::NotInstalled(slug.to_string()));
        }
        tracing::info!(slug, "skill deleted");
        Ok(())
    }

    /// Path of an installed skill's Markdown file, if present.
    pub fn installed(&self, slug: &str) -> Option<PathBuf> {
        let flat = self.root.join(format!("{}.md", slug));
        if flat.is_file() {
            return Some(flat);
        }
        let bundled = self.root.join(slug).join(format!("{}.md", slug));
        bundled.is_file().then_some(bundled)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn validate_slug(slug: &str) -> Result<(), SkillStoreError> {
    let ok = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(SkillStoreError::InvalidSlug(slug.to_string()))
    }
}

#[cfg(test)]
#[path = "skills_tests.rs"]
mod tests;
