// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::component::Channel;
use chrono::TimeZone;

fn record() -> ServerRecord {
    let mut r = ServerRecord::new(1, "Orbit One", 27500, Channel::Beta);
    r.max_players = 8;
    r.start.world_id = "moon".to_string();
    r.start.difficulty = "Stationeer".to_string();
    r.start.start_location = "Crater".to_string();
    r.start.start_condition = "Vanilla".to_string();
    r
}

fn ctx(record: &ServerRecord) -> TokenContext<'_> {
    TokenContext {
        record,
        world_name: "The Moon",
        player: "Alice",
        last_player: "Bob",
        player_count: 3,
        now: Utc.with_ymd_and_hms(2026, 1, 15, 14, 5, 0).single().unwrap(),
    }
}

#[test]
fn curly_tokens_expand() {
    let r = record();
    let out = ctx(&r).expand("{player} on {server} ({world}) {player_count}/{max_players} port {port}");
    assert_eq!(out, "Alice on Orbit One (The Moon) 3/8 port 27500");
}

#[test]
fn time_date_and_channel_tokens() {
    let r = record();
    let out = ctx(&r).expand("{time} {date} {beta} {difficulty} {language}");
    assert_eq!(out, "14:05 2026-01-15 beta Stationeer english");
}

#[test]
fn world_falls_back_to_world_id() {
    let r = record();
    let mut c = ctx(&r);
    c.world_name = "";
    assert_eq!(c.expand("{world}"), "moon");
}

#[yare::parameterized(
    exact   = { "[ServerName]" },
    lower   = { "[servername]" },
    shouty  = { "[SERVERNAME]" },
    mixed   = { "[sErVeRnAmE]" },
)]
fn bracket_tokens_are_case_insensitive(token: &str) {
    let r = record();
    assert_eq!(ctx(&r).expand(token), "Orbit One");
}

#[test]
fn bracket_tokens_expand_all() {
    let r = record();
    let out = ctx(&r).expand("[WorldID]/[StartLocation]/[StartCondition]/[LastPlayer]");
    assert_eq!(out, "moon/Crater/Vanilla/Bob");
}

#[test]
fn unknown_tokens_pass_through() {
    let r = record();
    assert_eq!(ctx(&r).expand("{unknown} [Unknown]"), "{unknown} [Unknown]");
}

#[test]
fn repeated_tokens_all_expand() {
    let r = record();
    assert_eq!(ctx(&r).expand("{player}{player}"), "AliceAlice");
}
