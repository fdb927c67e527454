// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The roster log: one CSV-like line per player session.
//!
//! Field order: steam id, name (commas replaced with spaces), connect
//! RFC3339, disconnect RFC3339 or empty, session duration `HH:MM:SS`
//! (empty while online; derived, ignored on read-back), admin flag
//! `"0"`/`"1"`. Rewrites go through a `.tmp` sibling and a rename so a
//! crash never leaves a torn file.

use chrono::{DateTime, SecondsFormat, Utc};
use qm_core::{format_hms, ClientSession};
use std::fs;
use std::io;
use std::path::Path;

/// Encode one session as a roster line.
pub fn encode_line(session: &ClientSession) -> String {
    let disconnect = session
        .disconnected
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Nanos, true))
        .unwrap_or_default();
    let duration = session
        .disconnected
        .map(|t| {
            let secs = (t - session.connected).num_seconds().max(0) as u64;
            format_hms(secs)
        })
        .unwrap_or_default();
    format!(
        "{},{},{},{},{},{}",
        session.steam_id,
        session.name.replace(',', " "),
        session.connected.to_rfc3339_opts(SecondsFormat::Nanos, true),
        disconnect,
        duration,
        if session.admin { "1" } else { "0" },
    )
}

/// Decode one roster line. `None` for malformed lines; callers skip them.
pub fn parse_line(line: &str) -> Option<ClientSession> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != 6 {
        return None;
    }
    let connected = parse_rfc3339(fields[2])?;
    let disconnected = if fields[3].is_empty() {
        None
    } else {
        Some(parse_rfc3339(fields[3])?)
    };
    let mut session = ClientSession::new(fields[0], fields[1], connected);
    session.disconnected = disconnected;
    session.admin = fields[5] == "1";
    Some(session)
}

fn parse_rfc3339(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Append a single session line, creating the file if needed.
pub fn append_session(path: &Path, session: &ClientSession) -> io::Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", encode_line(session))
}

/// Rewrite the whole roster atomically: one line per unique session key,
/// later observations winning.
pub fn write_roster(path: &Path, sessions: &[ClientSession]) -> io::Result<()> {
    let mut deduped: Vec<ClientSession> = Vec::with_capacity(sessions.len());
    for session in sessions {
        match deduped.iter_mut().find(|s| s.key() == session.key()) {
            Some(existing) => existing.merge(session),
            None => deduped.push(session.clone()),
        }
    }

    let mut contents = String::new();
    for session in &deduped {
        contents.push_str(&encode_line(session));
        contents.push('\n');
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

/// Read every well-formed session line. A missing file is an empty roster.
pub fn read_roster(path: &Path) -> io::Result<Vec<ClientSession>> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    Ok(contents.lines().filter_map(parse_line).collect())
}

#[cfg(test)]
#[path = "roster_tests.rs"]
mod tests;
