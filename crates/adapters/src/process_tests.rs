// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg(unix)]

use super::*;

#[tokio::test]
async fn own_pid_is_alive() {
    assert!(pid_alive(std::process::id()).await);
}

#[tokio::test]
async fn absurd_pid_is_dead() {
    // Max pid on Linux is far below this.
    assert!(!pid_alive(3_999_999).await);
}

#[tokio::test]
async fn kill_then_liveness() {
    let mut child = tokio::process::Command::new("sleep")
        .arg("30")
        .spawn()
        .unwrap();
    let pid = child.id().unwrap();
    assert!(pid_alive(pid).await);

    kill_pid(pid, true).await.unwrap();
    // Reap so the pid is actually released, not a zombie.
    child.wait().await.unwrap();
    assert!(!pid_alive(pid).await);
}

#[tokio::test]
async fn kill_missing_pid_is_an_error() {
    assert!(kill_pid(3_999_999, false).await.is_err());
}
