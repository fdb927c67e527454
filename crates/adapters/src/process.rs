// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process liveness and termination by pid.
//!
//! Attached servers are controlled through their pid only (there is no
//! child handle after a control-plane restart), so both checks shell out
//! rather than holding process handles.

use crate::subprocess::{run_with_timeout, SIGNAL_TIMEOUT};
use tokio::process::Command;

/// Whether a process with the given pid is alive.
#[cfg(unix)]
pub async fn pid_alive(pid: u32) -> bool {
    let mut cmd = Command::new("kill");
    cmd.args(["-0", &pid.to_string()]);
    match run_with_timeout(cmd, SIGNAL_TIMEOUT, "pid liveness check").await {
        Ok(output) => output.status.success(),
        Err(e) => {
            tracing::warn!(pid, error = %e, "pid liveness check failed");
            false
        }
    }
}

#[cfg(windows)]
pub async fn pid_alive(pid: u32) -> bool {
    let mut cmd = Command::new("tasklist");
    cmd.args(["/FI", &format!("PID eq {pid}"), "/NH", "/FO", "CSV"]);
    match run_with_timeout(cmd, SIGNAL_TIMEOUT, "pid liveness check").await {
        Ok(output) => String::from_utf8_lossy(&output.stdout).contains(&format!("\"{pid}\"")),
        Err(e) => {
            tracing::warn!(pid, error = %e, "pid liveness check failed");
            false
        }
    }
}

/// Terminate a process by pid. `force` escalates to an unconditional
/// kill; otherwise a polite termination request is sent.
#[cfg(unix)]
pub async fn kill_pid(pid: u32, force: bool) -> Result<(), String> {
    let signal = if force { "-KILL" } else { "-TERM" };
    let mut cmd = Command::new("kill");
    cmd.args([signal, &pid.to_string()]);
    let output = run_with_timeout(cmd, SIGNAL_TIMEOUT, "kill").await?;
    if output.status.success() {
        Ok(())
    } else {
        Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
    }
}

#[cfg(windows)]
pub async fn kill_pid(pid: u32, force: bool) -> Result<(), String> {
    let mut cmd = Command::new("taskkill");
    cmd.args(["/PID", &pid.to_string()]);
    if force {
        cmd.arg("/F");
    }
    let output = run_with_timeout(cmd, SIGNAL_TIMEOUT, "taskkill").await?;
    if output.status.success() {
        Ok(())
    } else {
        Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
