// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat-token expansion for outbound messages.
//!
//! Curly tokens (`{player}`, `{server}`, ...) are the documented template
//! vocabulary; bracketed tokens (`[ServerName]`, `[WorldID]`, ...) are
//! legacy spellings accepted case-insensitively in free-form templates.

use crate::server::ServerRecord;
use chrono::{DateTime, Utc};

/// Everything a template may reference at expansion time.
#[derive(Debug, Clone)]
pub struct TokenContext<'a> {
    pub record: &'a ServerRecord,
    /// Display name of the loaded world; empty until observed in the log.
    pub world_name: &'a str,
    /// The player a message is addressed to (welcomes); may be empty.
    pub player: &'a str,
    /// The most recently connected player; may be empty.
    pub last_player: &'a str,
    pub player_count: usize,
    pub now: DateTime<Utc>,
}

impl TokenContext<'_> {
    /// Expand every known token in `template`.
    pub fn expand(&self, template: &str) -> String {
        let world = if self.world_name.is_empty() {
            self.record.start.world_id.as_str()
        } else {
            self.world_name
        };
        let time = self.now.format("%H:%M").to_string();
        let date = self.now.format("%Y-%m-%d").to_string();

        let mut out = template.to_string();
        let curly: [(&str, String); 12] = [
            ("{player}", self.player.to_string()),
            ("{lastplayer}", self.last_player.to_string()),
            ("{server}", self.record.name.clone()),
            ("{world}", world.to_string()),
            ("{time}", time.clone()),
            ("{date}", date.clone()),
            ("{player_count}", self.player_count.to_string()),
            ("{max_players}", self.record.max_players.to_string()),
            ("{port}", self.record.port.to_string()),
            ("{difficulty}", self.record.start.difficulty.clone()),
            ("{language}", self.record.start.language.clone()),
            ("{beta}", self.record.channel.token().to_string()),
        ];
        for (token, value) in curly {
            out = out.replace(token, &value);
        }

        let bracketed: [(&str, String); 8] = [
            ("[ServerName]", self.record.name.clone()),
            ("[WorldName]", world.to_string()),
            ("[WorldID]", self.record.start.world_id.clone()),
            ("[StartLocation]", self.record.start.start_location.clone()),
            ("[StartCondition]", self.record.start.start_condition.clone()),
            ("[Date]", date),
            ("[Time]", time),
            ("[LastPlayer]", self.last_player.to_string()),
        ];
        for (token, value) in bracketed {
            out = replace_ci(&out, token, &value);
        }
        out
    }
}

/// Replace every case-insensitive occurrence of `needle` (ASCII) in
/// `haystack`. Byte-wise ASCII comparison keeps this safe for non-ASCII
/// surrounding text.
fn replace_ci(haystack: &str, needle: &str, value: &str) -> String {
    if needle.is_empty() {
        return haystack.to_string();
    }
    let mut out = String::with_capacity(haystack.len());
    let mut rest = haystack;
    while let Some(pos) = find_ci(rest, needle) {
        out.push_str(&rest[..pos]);
        out.push_str(value);
        rest = &rest[pos + needle.len()..];
    }
    out.push_str(rest);
    out
}

fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.len() > h.len() {
        return None;
    }
    (0..=h.len() - n.len())
        .find(|&i| haystack.is_char_boundary(i) && h[i..i + n.len()].eq_ignore_ascii_case(n))
}

#[cfg(test)]
#[path = "tokens_tests.rs"]
mod tests;
