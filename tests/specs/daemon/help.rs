//! Daemon help and version specs
//!
//! Verify qmd --help, --version, and related flags work without
//! touching the root directory or the daemon lock.

use crate::prelude::*;
use std::process::Command;

fn qmd() -> Command {
    Command::new(qmd_binary())
}

#[test]
fn qmd_version_shows_version() {
    let output = qmd().arg("--version").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("qmd 0.1.0"), "got: {stdout}");
}

#[test]
fn qmd_short_version_flags() {
    for flag in ["-v", "-V"] {
        let output = qmd().arg(flag).output().unwrap();
        assert!(output.status.success(), "{flag}");
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.starts_with("qmd "), "{flag}: {stdout}");
    }
}

#[test]
fn qmd_help_shows_usage() {
    let output = qmd().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("USAGE:"), "got: {stdout}");
    assert!(stdout.contains("--help"));
    assert!(stdout.contains("--version"));
    assert!(stdout.contains("QM_ROOT"));
}

#[test]
fn qmd_rejects_unknown_arguments() {
    let output = qmd().arg("--bogus").output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unexpected argument"), "got: {stderr}");
}
