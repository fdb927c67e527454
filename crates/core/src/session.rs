// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client sessions.
//!
//! A session is one connection of one player to one server. Sessions are
//! deduplicated by `(id or lowercased name, connect timestamp)` where two
//! connect timestamps within one second are the same observation; repeated
//! observations merge fields instead of appending.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One player connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSession {
    /// Steam-style identifier; may be empty when the log line lacked one.
    pub steam_id: String,
    pub name: String,
    pub connected: DateTime<Utc>,
    pub disconnected: Option<DateTime<Utc>>,
    pub admin: bool,
}

impl ClientSession {
    pub fn new(steam_id: impl Into<String>, name: impl Into<String>, connected: DateTime<Utc>) -> Self {
        Self {
            steam_id: steam_id.into(),
            name: name.into(),
            connected,
            disconnected: None,
            admin: false,
        }
    }

    /// A session is online until a disconnect is observed.
    pub fn is_online(&self) -> bool {
        self.disconnected.is_none()
    }

    /// The identity half of the session key: steam id when present,
    /// otherwise the lowercased name.
    pub fn identity(&self) -> String {
        if self.steam_id.is_empty() {
            self.name.to_lowercase()
        } else {
            self.steam_id.clone()
        }
    }

    /// Full deduplication key: identity plus RFC3339-nano connect time.
    pub fn key(&self) -> String {
        format!(
            "{}|{}",
            self.identity(),
            self.connected.to_rfc3339_opts(SecondsFormat::Nanos, true)
        )
    }

    /// Whether `other` is a repeat observation of this session: same
    /// identity and a connect timestamp within one second.
    pub fn same_session(&self, other: &Self) -> bool {
        if self.identity() != other.identity() {
            return false;
        }
        (self.connected - other.connected).num_seconds().abs() <= 1
    }

    /// Merge a repeat observation into this session. Later observations
    /// win for the name; ids fill in when previously empty; a disconnect
    /// sticks once seen; admin is sticky.
    pub fn merge(&mut self, other: &Self) {
        if !other.name.is_empty() {
            self.name = other.name.clone();
        }
        if self.steam_id.is_empty() && !other.steam_id.is_empty() {
            self.steam_id = other.steam_id.clone();
        }
        if other.disconnected.is_some() {
            self.disconnected = other.disconnected;
        }
        self.admin |= other.admin;
    }
}

/// Merge `incoming` into `sessions`: a repeat observation updates the
/// existing entry, a new one is appended. Returns `true` when appended.
pub fn upsert_session(sessions: &mut Vec<ClientSession>, incoming: ClientSession) -> bool {
    for existing in sessions.iter_mut() {
        if existing.same_session(&incoming) {
            existing.merge(&incoming);
            return false;
        }
    }
    sessions.push(incoming);
    true
}

/// Find the most recent online session matching a steam id or
/// (case-insensitively) a name.
pub fn find_online_mut<'a>(
    sessions: &'a mut [ClientSession],
    steam_id: &str,
    name: &str,
) -> Option<&'a mut ClientSession> {
    let lower = name.to_lowercase();
    sessions.iter_mut().rev().find(|s| {
        s.is_online()
            && ((!steam_id.is_empty() && s.steam_id == steam_id)
                || (!lower.is_empty() && s.name.to_lowercase() == lower))
    })
}

/// Count of sessions with no disconnect timestamp.
pub fn online_count(sessions: &[ClientSession]) -> usize {
    sessions.iter().filter(|s| s.is_online()).count()
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
