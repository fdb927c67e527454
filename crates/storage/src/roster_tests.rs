// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use proptest::prelude::*;

fn t(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).single().unwrap() + chrono::Duration::seconds(secs)
}

fn session() -> ClientSession {
    let mut s = ClientSession::new("76561198000000001", "Alice", t(0));
    s.disconnected = Some(t(10));
    s
}

#[test]
fn encode_fields_in_order() {
    let line = encode_line(&session());
    let fields: Vec<&str> = line.split(',').collect();
    assert_eq!(fields.len(), 6);
    assert_eq!(fields[0], "76561198000000001");
    assert_eq!(fields[1], "Alice");
    assert!(fields[2].starts_with("2026-01-15T10:00:00"));
    assert!(fields[3].starts_with("2026-01-15T10:00:10"));
    assert_eq!(fields[4], "00:00:10");
    assert_eq!(fields[5], "0");
}

#[test]
fn commas_in_names_become_spaces() {
    let mut s = session();
    s.name = "Alice,the,Brave".to_string();
    let line = encode_line(&s);
    assert_eq!(line.split(',').count(), 6);
    assert!(line.contains("Alice the Brave"));
}

#[test]
fn online_session_has_empty_disconnect_and_duration() {
    let s = ClientSession::new("1", "Bob", t(0));
    let fields: Vec<String> = encode_line(&s).split(',').map(String::from).collect();
    assert_eq!(fields[3], "");
    assert_eq!(fields[4], "");
}

#[test]
fn admin_flag_round_trips() {
    let mut s = session();
    s.admin = true;
    let back = parse_line(&encode_line(&s)).unwrap();
    assert!(back.admin);
}

#[yare::parameterized(
    empty        = { "" },
    short        = { "a,b,c" },
    bad_connect  = { "id,name,not-a-time,,," },
)]
fn malformed_lines_are_skipped(line: &str) {
    assert!(parse_line(line).is_none());
}

#[test]
fn write_then_read_reconstructs_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("players.log");
    let mut online = ClientSession::new("2", "Bob", t(5));
    online.admin = true;
    let sessions = vec![session(), online];

    write_roster(&path, &sessions).unwrap();
    let back = read_roster(&path).unwrap();

    assert_eq!(back.len(), 2);
    assert_eq!(back[0].steam_id, "76561198000000001");
    assert_eq!(back[0].disconnected, Some(t(10)));
    assert_eq!(back[1].name, "Bob");
    assert!(back[1].admin);
    assert!(back[1].is_online());
}

#[test]
fn rewrite_dedups_by_session_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("players.log");

    let open = ClientSession::new("A", "Alice", t(0));
    let mut closed = ClientSession::new("A", "Alice", t(0));
    closed.disconnected = Some(t(30));

    write_roster(&path, &[open, closed]).unwrap();
    let back = read_roster(&path).unwrap();
    assert_eq!(back.len(), 1, "one line per unique session key");
    assert_eq!(back[0].disconnected, Some(t(30)));
}

#[test]
fn append_then_rewrite_leaves_no_tmp_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("players.log");
    append_session(&path, &session()).unwrap();
    write_roster(&path, &[session()]).unwrap();
    assert!(!path.with_extension("tmp").exists());
}

#[test]
fn missing_roster_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(read_roster(&dir.path().join("nope.log")).unwrap(), Vec::new());
}

proptest! {
    #[test]
    fn round_trip_preserves_identity(
        id in "[0-9]{0,17}",
        name in "[A-Za-z0-9 _-]{1,24}",
        admin in any::<bool>(),
        dur in 0i64..86_400,
        online in any::<bool>(),
    ) {
        let mut s = ClientSession::new(id.clone(), name.clone(), t(0));
        s.admin = admin;
        if !online {
            s.disconnected = Some(t(dur));
        }
        let back = parse_line(&encode_line(&s)).unwrap();
        prop_assert_eq!(back.steam_id, id);
        prop_assert_eq!(back.name, name);
        prop_assert_eq!(back.admin, admin);
        prop_assert_eq!(back.connected, s.connected);
        prop_assert_eq!(back.disconnected, s.disconnected);
    }
}
