// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;

fn path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("blacklist.txt")
}

#[test]
fn add_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let p = path(&dir);
    add(&p, "100").unwrap();
    add(&p, "100").unwrap();
    assert_eq!(load(&p).unwrap(), vec!["100"]);
}

#[test]
fn insertion_order_is_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let p = path(&dir);
    add(&p, "300").unwrap();
    add(&p, "100").unwrap();
    add(&p, "200").unwrap();
    assert_eq!(load(&p).unwrap(), vec!["300", "100", "200"]);
    assert_eq!(std::fs::read_to_string(&p).unwrap(), "300,100,200");
}

#[test]
fn remove_absent_id_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let p = path(&dir);
    add(&p, "100").unwrap();
    let entries = remove(&p, "999").unwrap();
    assert_eq!(entries, vec!["100"]);
}

#[test]
fn remove_keeps_order_of_rest() {
    let dir = tempfile::tempdir().unwrap();
    let p = path(&dir);
    for id in ["1", "2", "3"] {
        add(&p, id).unwrap();
    }
    remove(&p, "2").unwrap();
    assert_eq!(load(&p).unwrap(), vec!["1", "3"]);
}

#[test]
fn missing_file_is_empty_and_remove_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let p = path(&dir);
    assert!(load(&p).unwrap().is_empty());
    remove(&p, "1").unwrap();
    assert!(!p.exists());
}

#[test]
fn empty_and_whitespace_ids_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let p = path(&dir);
    add(&p, "  ").unwrap();
    assert!(load(&p).unwrap().is_empty());
}

#[test]
fn file_is_a_single_line() {
    let dir = tempfile::tempdir().unwrap();
    let p = path(&dir);
    add(&p, "1").unwrap();
    add(&p, "2").unwrap();
    let contents = std::fs::read_to_string(&p).unwrap();
    assert!(!contents.contains('\n'));
}
