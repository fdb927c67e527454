// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn t(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).single().unwrap() + chrono::Duration::milliseconds(secs * 1000)
}

fn tms(ms: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).single().unwrap() + chrono::Duration::milliseconds(ms)
}

#[test]
fn identity_prefers_steam_id() {
    let s = ClientSession::new("76561198000000001", "Alice", t(0));
    assert_eq!(s.identity(), "76561198000000001");
}

#[test]
fn identity_falls_back_to_lowercased_name() {
    let s = ClientSession::new("", "Alice", t(0));
    assert_eq!(s.identity(), "alice");
}

#[test]
fn key_includes_nano_timestamp() {
    let s = ClientSession::new("123", "Alice", t(0));
    assert!(s.key().starts_with("123|2026-01-15T10:00:00"));
}

#[test]
fn same_session_within_one_second() {
    let a = ClientSession::new("123", "Alice", t(0));
    let b = ClientSession::new("123", "Alice", tms(500));
    assert!(a.same_session(&b));
}

#[test]
fn different_session_beyond_one_second() {
    let a = ClientSession::new("123", "Alice", t(0));
    let b = ClientSession::new("123", "Alice", t(5));
    assert!(!a.same_session(&b));
}

#[test]
fn merge_takes_later_name() {
    // Observe (id=A, name=X, t), then (id=A, name=Y, t+500ms): one session
    // whose name is Y.
    let mut sessions = Vec::new();
    upsert_session(&mut sessions, ClientSession::new("A", "X", t(0)));
    upsert_session(&mut sessions, ClientSession::new("A", "Y", tms(500)));

    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].name, "Y");
}

#[test]
fn merge_is_sticky_for_admin_and_disconnect() {
    let mut base = ClientSession::new("A", "X", t(0));
    let mut dup = ClientSession::new("A", "X", t(0));
    dup.admin = true;
    dup.disconnected = Some(t(10));
    base.merge(&dup);
    assert!(base.admin);
    assert_eq!(base.disconnected, Some(t(10)));

    // A later observation without a disconnect does not clear it.
    let plain = ClientSession::new("A", "X", t(0));
    base.merge(&plain);
    assert_eq!(base.disconnected, Some(t(10)));
}

#[test]
fn merge_fills_empty_id() {
    let mut base = ClientSession::new("", "Alice", t(0));
    let named = ClientSession::new("123", "Alice", t(0));
    // Same identity required for same_session; merge directly.
    base.merge(&named);
    assert_eq!(base.steam_id, "123");
}

#[test]
fn upsert_appends_distinct_sessions() {
    let mut sessions = Vec::new();
    assert!(upsert_session(&mut sessions, ClientSession::new("A", "X", t(0))));
    assert!(upsert_session(&mut sessions, ClientSession::new("B", "Y", t(0))));
    assert!(upsert_session(&mut sessions, ClientSession::new("A", "X", t(60))));
    assert_eq!(sessions.len(), 3);
}

#[test]
fn find_online_matches_id_then_name_case_insensitively() {
    let mut sessions = vec![
        ClientSession::new("A", "Alice", t(0)),
        ClientSession::new("B", "Bob", t(1)),
    ];
    assert_eq!(find_online_mut(&mut sessions, "B", "nope").map(|s| s.name.clone()), Some("Bob".into()));
    assert_eq!(find_online_mut(&mut sessions, "", "ALICE").map(|s| s.steam_id.clone()), Some("A".into()));
}

#[test]
fn find_online_skips_disconnected() {
    let mut sessions = vec![ClientSession::new("A", "Alice", t(0))];
    sessions[0].disconnected = Some(t(5));
    assert!(find_online_mut(&mut sessions, "A", "Alice").is_none());
}

#[test]
fn online_count_matches_null_disconnects() {
    let mut sessions = vec![
        ClientSession::new("A", "Alice", t(0)),
        ClientSession::new("B", "Bob", t(1)),
    ];
    assert_eq!(online_count(&sessions), 2);
    sessions[1].disconnected = Some(t(9));
    assert_eq!(online_count(&sessions), 1);
}
