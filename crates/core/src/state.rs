// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor lifecycle states.

use serde::{Deserialize, Serialize};

/// Lifecycle state of one managed server process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupervisorStatus {
    Idle,
    Starting,
    Running,
    Paused,
    Stopping,
    Failed,
}

impl SupervisorStatus {
    /// A live child process exists (or is presumed to) in these states.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SupervisorStatus::Starting
                | SupervisorStatus::Running
                | SupervisorStatus::Paused
                | SupervisorStatus::Stopping
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            SupervisorStatus::Idle => "idle",
            SupervisorStatus::Starting => "starting",
            SupervisorStatus::Running => "running",
            SupervisorStatus::Paused => "paused",
            SupervisorStatus::Stopping => "stopping",
            SupervisorStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SupervisorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
