// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use qm_core::Channel;

fn record(id: u32, port: u16) -> ServerRecord {
    ServerRecord::new(id, format!("server-{id}"), port, Channel::Release)
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fleet.toml");
    let servers = vec![record(1, 27500), record(2, 27510)];

    save_records(&path, &servers).unwrap();
    let back = load_records(&path).unwrap();

    assert_eq!(back.len(), 2);
    assert_eq!(back[0].id, 1);
    assert_eq!(back[1].port, 27510);
}

#[test]
fn missing_file_is_an_empty_fleet() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_records(&dir.path().join("fleet.toml")).unwrap().is_empty());
}

#[test]
fn duplicate_ids_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fleet.toml");
    let err = save_records(&path, &[record(1, 27500), record(1, 27510)]).unwrap_err();
    assert!(matches!(err, RecordsError::DuplicateId(1)));
}

#[test]
fn duplicate_ports_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fleet.toml");
    let err = save_records(&path, &[record(1, 27500), record(2, 27500)]).unwrap_err();
    assert!(matches!(err, RecordsError::DuplicatePort(27500)));
}

#[test]
fn sidecar_port_colliding_with_game_port_is_rejected() {
    // Server 2's game port lands on server 1's sidecar port (27501).
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fleet.toml");
    let err = save_records(&path, &[record(1, 27500), record(2, 27501)]).unwrap_err();
    assert!(matches!(err, RecordsError::DuplicatePort(27501)));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fleet.toml");
    std::fs::write(&path, "[[server]]\nid = \"not a number\"\n").unwrap();
    assert!(matches!(load_records(&path), Err(RecordsError::Parse(_))));
}
