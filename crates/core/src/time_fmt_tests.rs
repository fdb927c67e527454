// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    seconds      = { 5, "5s" },
    minute       = { 60, "1m" },
    minutes      = { 150, "2m" },
    hour         = { 3600, "1h" },
    hour_minutes = { 5400, "1h30m" },
    days         = { 259200, "3d" },
)]
fn elapsed(secs: u64, expected: &str) {
    assert_eq!(format_elapsed(secs), expected);
}

#[yare::parameterized(
    zero      = { 0, "00:00:00" },
    ten       = { 10, "00:00:10" },
    minute    = { 70, "00:01:10" },
    long      = { 3723, "01:02:03" },
    over_day  = { 90000, "25:00:00" },
)]
fn hms(secs: u64, expected: &str) {
    assert_eq!(format_hms(secs), expected);
}
