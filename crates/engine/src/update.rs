// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Self-update coordinator.
//!
//! An update request writes a transient restart script and launches it
//! detached; the daemon then shuts down and the script re-executes the
//! binary once the process is gone. Script output goes to `update.log`.

use std::path::PathBuf;

/// Writes and launches the transient update script.
#[derive(Clone)]
pub struct UpdateCoordinator {
    script_path: PathBuf,
    log_path: PathBuf,
    version: String,
}

impl UpdateCoordinator {
    pub fn new(script_path: PathBuf, log_path: PathBuf, version: String) -> Self {
        Self {
            script_path,
            log_path,
            version,
        }
    }

    /// Current daemon version, reported on manual update checks.
    pub fn check(&self) -> String {
        format!("milo-agent {}", self.version)
    }

    /// Write the restart script. Returns its path.
    pub fn prepare(&self) -> std::io::Result<PathBuf> {
        let exe = std::env::current_exe()?;
        let script = format!(
            "#!/bin/sh\n\
             # Transient self-update script; removed on next daemon startup.\n\
             echo \"update: waiting for daemon to exit\"\n\
             sleep 2\n\
             echo \"update: restarting {exe}\"\n\
             exec {exe}\n",
            exe = exe.display()
        );
        if let Some(parent) = self.script_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.script_path, script)?;
        Ok(self.script_path.clone())
    }

    /// Launch the prepared script detached, logging to `update.log`.
    pub fn launch(&self) -> std::io::Result<()> {
        let log = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        let err_log = log.try_clone()?;

        std::process::Command::new("sh")
            .arg(&self.script_path)
            .stdin(std::process::Stdio::null())
            .stdout(log)
            .stderr(err_log)
            .spawn()?;
        tracing::info!(script = %self.script_path.display(), "update script launched");
        Ok(())
    }

    /// Remove a leftover script from a previous run.
    pub fn cleanup(&self) {
        if self.script_path.exists() {
            let _ = std::fs::remove_file(&self.script_path);
        }
    }
}

#[cfg(test)]
#[path = "update_tests.rs"]
mod tests;
