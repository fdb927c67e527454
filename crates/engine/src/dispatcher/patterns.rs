// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compiled matcher patterns and pure line-parsing helpers.
//!
//! Patterns are contracts over the server's log vocabulary, not exact
//! upstream strings; each has unit tests pinning the accepted shapes.

use chrono::{DateTime, NaiveTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

pub(crate) struct Patterns {
    pub world_saved: Regex,
    pub client_ready: Regex,
    pub client_disconnected: Regex,
    pub difficulty: Regex,
    pub world_loaded: Regex,
    pub admin: Regex,
    pub chat: Regex,
    pub pause: Regex,
    pub weather: Regex,
    pub server_ready: Regex,
    pub clients_header: Regex,
    pub clients_entry: Regex,
    pub clients_footer: Regex,
    pub invalid_world: Regex,
    line_time: Regex,
}

// Patterns are literals; a failed compile is a programming error.
#[allow(clippy::unwrap_used)]
pub(crate) fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        world_saved: Regex::new(r"World Saved|Saving - file created|: Saved \S+").unwrap(),
        client_ready: Regex::new(r"Client (.+?) \((\d+)\) is ready").unwrap(),
        client_disconnected: Regex::new(r"Client (.+?) \((\d+)\) disconnected").unwrap(),
        difficulty: Regex::new(r"Set difficulty to (\S+)").unwrap(),
        world_loaded: Regex::new(r"(?i)loading world (.+)$").unwrap(),
        admin: Regex::new(r"(?i)admin (?:command|login)[^(]*\((\d+)\)").unwrap(),
        chat: Regex::new(r"^(\d{2}:\d{2}:\d{2}): ([^:]+): (.+)$").unwrap(),
        pause: Regex::new(r"(?i)\bserver (paused|unpaused|resumed)\b").unwrap(),
        weather: Regex::new(r"(?i)\b(?:weather event|storm) (started|stopped|ended)\b").unwrap(),
        server_ready: Regex::new(r"(?i)started server|ready for (?:connections|players)")
            .unwrap(),
        clients_header: Regex::new(r"^CLIENTS \((\d+)\)").unwrap(),
        clients_entry: Regex::new(r"^\s*\d+[.:)]\s+(.+?) \((\d+)\)\s*$").unwrap(),
        clients_footer: Regex::new(r"(?i)host client").unwrap(),
        invalid_world: Regex::new(r"No such world name: '?([^'.]+?)'?\. Valid worlds: (.+)")
            .unwrap(),
        line_time: Regex::new(r"^(\d{2}):(\d{2}):(\d{2}):").unwrap(),
    })
}

/// Timestamp for a log line: its `HH:MM:SS:` prefix on today's date when
/// present, otherwise `now`.
pub fn line_time(line: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(caps) = patterns().line_time.captures(line) else {
        return now;
    };
    let (Some(h), Some(m), Some(s)) = (caps.get(1), caps.get(2), caps.get(3)) else {
        return now;
    };
    let parsed = format!("{}:{}:{}", h.as_str(), m.as_str(), s.as_str());
    match NaiveTime::parse_from_str(&parsed, "%H:%M:%S") {
        Ok(time) => now
            .date_naive()
            .and_time(time)
            .and_utc(),
        Err(_) => now,
    }
}

/// Strip the quoting and punctuation servers wrap world tokens in.
pub fn clean_world_token(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| "'\"[](){}.,!".contains(c))
        .to_string()
}

/// Queued player-save name: `DDMMYY_HHMMSS_<id>`.
pub fn save_name(steam_id: &str, at: DateTime<Utc>) -> String {
    format!("{}_{}", at.format("%d%m%y_%H%M%S"), steam_id)
}

#[cfg(test)]
#[path = "patterns_tests.rs"]
mod tests;
