// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session Markdown transcript files.
//!
//! Human-readable mirror of the session audit log, one file per session
//! under the transcripts directory. Append failures are logged and swallowed
//! — the durable record is the session_log table.

use milo_core::SessionId;
use std::io::Write;
use std::path::PathBuf;

/// Appends Markdown transcript entries per session.
#[derive(Clone)]
pub struct TranscriptWriter {
    root: PathBuf,
}

impl TranscriptWriter {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Append one entry. Creates the directory and file on first write.
    pub fn append(&self, session_id: &SessionId, sender: &str, content: &str) {
        if let Err(e) = self.try_append(session_id, sender, content) {
            tracing::warn!(
                session_id = %session_id,
                error = %e,
                "failed to append transcript entry"
            );
        }
    }

    fn try_append(
        &self,
        session_id: &SessionId,
        sender: &str,
        content: &str,
    ) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.path_for(session_id);
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        let timestamp = chrono::Utc::now().to_rfc3339();
        writeln!(file, "**{}** ({}):\n\n{}\n", sender, timestamp, content)
    }

    /// Transcript file path for a session.
    pub fn path_for(&self, session_id: &SessionId) -> PathBuf {
        // Session ids are externally minted; keep only path-safe characters.
        let safe: String = session_id
            .as_str()
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
                _ => '-',
            })
            .collect();
        self.root.join(format!("{}.md", safe))
    }
}

#[cfg(test)]
#[path = "transcript_tests.rs"]
mod tests;
