// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::fs;
use tempfile::TempDir;

fn setup() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let dst = dir.path().join("dst");
    fs::create_dir_all(&src).unwrap();
    (dir, src, dst)
}

fn write(root: &Path, rel: &str, contents: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn run(src: &Path, dst: &Path) -> (MirrorStats, Vec<(PathBuf, FileOutcome)>) {
    let mut seen = Vec::new();
    let stats = mirror(src, dst, &mut |rel, outcome| {
        seen.push((rel.to_path_buf(), outcome));
    })
    .unwrap();
    (stats, seen)
}

#[test]
fn first_run_copies_everything() {
    let (_dir, src, dst) = setup();
    write(&src, "a.txt", b"alpha");
    write(&src, "nested/b.txt", b"beta");
    write(&src, "nested/deep/c.txt", b"gamma");

    let (stats, seen) = run(&src, &dst);
    assert_eq!(stats, MirrorStats { copied: 3, skipped: 0 });
    assert_eq!(seen.len(), 3);
    assert_eq!(fs::read(dst.join("nested/deep/c.txt")).unwrap(), b"gamma");
}

#[test]
fn second_run_copies_nothing() {
    let (_dir, src, dst) = setup();
    write(&src, "a.txt", b"alpha");
    write(&src, "b.txt", b"beta");
    run(&src, &dst);

    let (stats, _) = run(&src, &dst);
    assert_eq!(stats, MirrorStats { copied: 0, skipped: 2 });
}

#[test]
fn size_change_triggers_copy() {
    let (_dir, src, dst) = setup();
    write(&src, "a.txt", b"short");
    run(&src, &dst);

    write(&src, "a.txt", b"considerably longer");
    let (stats, _) = run(&src, &dst);
    assert_eq!(stats.copied, 1);
    assert_eq!(fs::read(dst.join("a.txt")).unwrap(), b"considerably longer");
}

#[test]
fn same_size_different_content_triggers_copy() {
    // Mutate the destination: same length, different bytes. Only the
    // hash check can catch this.
    let (_dir, src, dst) = setup();
    write(&src, "a.txt", b"AAAA");
    write(&src, "b.txt", b"keep");
    write(&src, "c.txt", b"keep2");
    run(&src, &dst);

    fs::write(dst.join("a.txt"), b"BBBB").unwrap();
    let (stats, seen) = run(&src, &dst);
    assert_eq!(stats, MirrorStats { copied: 1, skipped: 2 });
    let copied: Vec<_> = seen
        .iter()
        .filter(|(_, o)| *o == FileOutcome::Copied)
        .map(|(p, _)| p.clone())
        .collect();
    assert_eq!(copied, vec![PathBuf::from("a.txt")]);
    assert_eq!(fs::read(dst.join("a.txt")).unwrap(), b"AAAA");
}

#[test]
fn tracker_fires_once_per_file() {
    let (_dir, src, dst) = setup();
    write(&src, "a.txt", b"1");
    write(&src, "b.txt", b"2");
    let mut calls = 0;
    mirror(&src, &dst, &mut |_, _| calls += 1).unwrap();
    assert_eq!(calls, 2);
    mirror(&src, &dst, &mut |_, _| calls += 1).unwrap();
    assert_eq!(calls, 4);
}

#[cfg(unix)]
#[test]
fn modes_are_normalized() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, src, dst) = setup();
    write(&src, "run.sh", b"#!/bin/sh\n");
    write(&src, "tool", b"\x7fELF");
    write(&src, "data.bin", b"data");
    fs::set_permissions(src.join("tool"), fs::Permissions::from_mode(0o700)).unwrap();
    fs::set_permissions(src.join("data.bin"), fs::Permissions::from_mode(0o600)).unwrap();

    run(&src, &dst);

    let mode = |rel: &str| fs::metadata(dst.join(rel)).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode("run.sh"), 0o755, "scripts get 0755");
    assert_eq!(mode("tool"), 0o755, "executables get 0755");
    assert_eq!(mode("data.bin"), 0o644, "plain files get 0644");
}

#[test]
fn mirrored_files_hash_equal() {
    let (_dir, src, dst) = setup();
    write(&src, "a/b/c.dat", &[0u8; 4096]);
    run(&src, &dst);
    assert_eq!(
        sha256_file(&src.join("a/b/c.dat")).unwrap(),
        sha256_file(&dst.join("a/b/c.dat")).unwrap()
    );
}

#[test]
fn count_files_spans_roots_and_skips_missing() {
    let (_dir, src, dst) = setup();
    write(&src, "a.txt", b"1");
    write(&src, "d/b.txt", b"2");
    let missing = src.join("not-there");
    let total = count_files(&[&src, &missing]).unwrap();
    assert_eq!(total, 2);
    drop(dst);
}

#[test]
fn unreadable_source_root_is_a_walk_error() {
    let err = mirror(Path::new("/nonexistent/source"), Path::new("/tmp/out"), &mut |_, _| {});
    assert!(matches!(err, Err(MirrorError::Walk { .. })));
}
