// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attached-pid state.
//!
//! Server processes outlive the control plane when marked detached. The
//! pid of every live child is persisted here after each start/stop so a
//! restarted daemon can find and re-attach them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct PidState {
    /// server id → pid
    servers: BTreeMap<u32, u32>,
}

/// Handle over the pid state file.
#[derive(Debug, Clone)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// All persisted (server id, pid) pairs. Missing file means none.
    pub fn load(&self) -> io::Result<Vec<(u32, u32)>> {
        let state = self.read_state()?;
        Ok(state.servers.into_iter().collect())
    }

    /// Record the pid for a server and persist.
    pub fn set(&self, server_id: u32, pid: u32) -> io::Result<()> {
        let mut state = self.read_state()?;
        state.servers.insert(server_id, pid);
        self.write_state(&state)
    }

    /// Forget a server's pid (it exited or was stopped) and persist.
    pub fn clear(&self, server_id: u32) -> io::Result<()> {
        let mut state = self.read_state()?;
        if state.servers.remove(&server_id).is_some() {
            self.write_state(&state)?;
        }
        Ok(())
    }

    fn read_state(&self) -> io::Result<PidState> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(PidState::default()),
            Err(e) => return Err(e),
        };
        // A torn or hand-edited file must not keep the daemon from
        // starting; it just loses the attachments.
        match serde_json::from_str(&contents) {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "pid state unreadable, starting empty");
                Ok(PidState::default())
            }
        }
    }

    fn write_state(&self, state: &PidState) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_string_pretty(state).unwrap_or_default())?;
        fs::rename(&tmp, &self.path)
    }
}

#[cfg(test)]
#[path = "pids_tests.rs"]
mod tests;
