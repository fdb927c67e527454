// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress records for component deploys and per-server copies.
//!
//! One entry exists per component from orchestrator startup onward and is
//! reset on each begin; per-server entries use the same shape with file
//! counts in place of byte counts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mutable progress record for one component deploy or one server copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    /// Short free-form stage label. Never empty once begun.
    pub stage: String,
    /// Percent in `[0, 100]`, derived from `downloaded`/`total` when the
    /// total is known.
    pub percent: u8,
    /// Bytes downloaded (or files processed for server copies).
    pub downloaded: u64,
    /// Total bytes (or files). Zero means indeterminate.
    pub total: u64,
    pub running: bool,
    /// Most recent error message; empty when the last run succeeded.
    pub error: String,
    pub updated_at: DateTime<Utc>,
}

impl ProgressEntry {
    /// Fresh idle entry.
    pub fn idle(at: DateTime<Utc>) -> Self {
        Self {
            stage: "Idle".to_string(),
            percent: 0,
            downloaded: 0,
            total: 0,
            running: false,
            error: String::new(),
            updated_at: at,
        }
    }

    /// Reset for a new run.
    pub fn begin(&mut self, stage: &str, at: DateTime<Utc>) {
        self.stage = stage.to_string();
        self.percent = 0;
        self.downloaded = 0;
        self.total = 0;
        self.running = true;
        self.error.clear();
        self.updated_at = at;
    }

    /// Record an in-flight update from the installer callback.
    pub fn update(&mut self, stage: &str, downloaded: u64, total: u64, at: DateTime<Utc>) {
        if !stage.is_empty() {
            self.stage = stage.to_string();
        }
        self.downloaded = downloaded;
        self.total = total;
        self.percent = derive_percent(downloaded, total);
        self.updated_at = at;
    }

    /// Finish the run. A successful completion pins percent at 100; a
    /// failed one never reports 100 so `running=false && percent=100`
    /// implies success.
    pub fn complete(&mut self, stage: &str, error: Option<&str>, at: DateTime<Utc>) {
        self.stage = stage.to_string();
        self.running = false;
        self.updated_at = at;
        match error {
            None => {
                self.error.clear();
                self.percent = 100;
            }
            Some(message) => {
                self.error = message.to_string();
                self.percent = self.percent.min(99);
            }
        }
    }
}

/// Percent in `[0, 100]`; indeterminate totals report 0.
pub fn derive_percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = done.saturating_mul(100) / total;
    pct.min(100) as u8
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
