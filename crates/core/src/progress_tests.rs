// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).single().unwrap()
}

#[yare::parameterized(
    indeterminate = { 50, 0, 0 },
    zero          = { 0, 100, 0 },
    half          = { 50, 100, 50 },
    done          = { 100, 100, 100 },
    overshoot     = { 150, 100, 100 },
    rounding_down = { 1, 3, 33 },
)]
fn percent_derivation(done: u64, total: u64, expected: u8) {
    assert_eq!(derive_percent(done, total), expected);
}

#[test]
fn begin_resets_previous_run() {
    let mut entry = ProgressEntry::idle(at());
    entry.update("Downloading", 10, 20, at());
    entry.complete("Failed", Some("boom"), at());

    entry.begin("Queued", at());
    assert_eq!(entry.stage, "Queued");
    assert_eq!(entry.percent, 0);
    assert_eq!(entry.downloaded, 0);
    assert_eq!(entry.total, 0);
    assert!(entry.running);
    assert!(entry.error.is_empty());
}

#[test]
fn update_keeps_stage_when_empty() {
    let mut entry = ProgressEntry::idle(at());
    entry.begin("Downloading", at());
    entry.update("", 5, 10, at());
    assert_eq!(entry.stage, "Downloading");
    assert_eq!(entry.percent, 50);
}

#[test]
fn successful_completion_pins_percent() {
    let mut entry = ProgressEntry::idle(at());
    entry.begin("Queued", at());
    entry.update("Downloading", 3, 10, at());
    entry.complete("Completed", None, at());
    assert!(!entry.running);
    assert_eq!(entry.percent, 100);
    assert!(entry.error.is_empty());
}

#[test]
fn failed_completion_never_reports_100() {
    let mut entry = ProgressEntry::idle(at());
    entry.begin("Queued", at());
    entry.update("Downloading", 10, 10, at());
    entry.complete("Failed", Some("disk full"), at());
    assert!(!entry.running);
    assert_eq!(entry.error, "disk full");
    assert!(entry.percent < 100);
}

#[test]
fn completion_timestamp_reflects_the_moment() {
    let mut entry = ProgressEntry::idle(at());
    entry.begin("Queued", at());
    let done = at() + chrono::Duration::seconds(42);
    entry.complete("Completed", None, done);
    assert_eq!(entry.updated_at, done);
}
