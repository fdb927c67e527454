//! Daemon lifecycle specs
//!
//! Start the daemon against a temp root, verify single-instance
//! enforcement, and check it shuts down cleanly on SIGTERM.

#![cfg(unix)]

use crate::prelude::*;
use std::process::{Child, Command, Stdio};

fn spawn_qmd(root: &std::path::Path) -> Child {
    Command::new(qmd_binary())
        .env("QM_ROOT", root)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap()
}

fn send_sigterm(child: &Child) {
    let _ = Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .output();
}

#[test]
fn daemon_starts_and_stops_on_sigterm() {
    let dir = tempfile::tempdir().unwrap();
    let lock = dir.path().join("state/qmd.lock");
    let mut child = spawn_qmd(dir.path());

    assert!(wait_for(|| lock.exists()), "daemon never came up");
    assert_eq!(
        std::fs::read_to_string(&lock).unwrap().trim(),
        child.id().to_string()
    );

    send_sigterm(&child);
    assert!(
        wait_for(|| child.try_wait().ok().flatten().is_some()),
        "daemon did not exit on SIGTERM"
    );
    assert!(child.wait().unwrap().success());
    assert!(!lock.exists(), "lock released on shutdown");
}

#[test]
fn second_instance_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let lock = dir.path().join("state/qmd.lock");
    let mut first = spawn_qmd(dir.path());
    assert!(wait_for(|| lock.exists()));

    let output = Command::new(qmd_binary())
        .env("QM_ROOT", dir.path())
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("already running"), "got: {stderr}");

    send_sigterm(&first);
    let _ = first.wait();
}

#[test]
fn daemon_writes_its_log() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("logs/qmd.log");
    let mut child = spawn_qmd(dir.path());

    assert!(wait_for(|| log.exists()), "daemon log never appeared");

    send_sigterm(&child);
    let _ = child.wait();
    let contents = std::fs::read_to_string(&log).unwrap();
    assert!(contents.contains("qmd up"), "got: {contents}");
}
