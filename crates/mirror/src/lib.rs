// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! qm-mirror: content-addressed directory mirroring.
//!
//! `mirror` replicates a source tree into a destination such that every
//! regular file under the source has an identical-content counterpart at
//! the corresponding destination path. The operation is incremental and
//! idempotent: a second run over an unchanged pair copies nothing and
//! only compares.
//!
//! This is synchronous filesystem code; async callers run it on the
//! blocking pool.

mod hash;

pub use hash::sha256_file;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Outcome of one file visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Copied,
    Skipped,
    Failed,
}

/// Aggregate result of a successful mirror pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorStats {
    pub copied: u64,
    pub skipped: u64,
}

/// Errors from mirroring.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("source walk failed at {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Per-file copy failures, joined. The mirror keeps going past
    /// individual failures; whatever copied stays in place and a re-run
    /// only revisits differing files.
    #[error("{} file(s) failed to copy: {}", failures.len(), join_failures(failures))]
    Copies { stats: MirrorStats, failures: Vec<(PathBuf, String)> },
}

fn join_failures(failures: &[(PathBuf, String)]) -> String {
    failures
        .iter()
        .map(|(path, msg)| format!("{}: {}", path.display(), msg))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Replicate `src` into `dst`, calling `on_file` once per regular file
/// attempted (copied, skipped, or failed).
pub fn mirror(
    src: &Path,
    dst: &Path,
    on_file: &mut dyn FnMut(&Path, FileOutcome),
) -> Result<MirrorStats, MirrorError> {
    let mut stats = MirrorStats::default();
    let mut failures: Vec<(PathBuf, String)> = Vec::new();

    visit(src, &mut |file| {
        let rel = match file.strip_prefix(src) {
            Ok(rel) => rel,
            Err(_) => return,
        };
        let target = dst.join(rel);
        match sync_file(file, &target) {
            Ok(true) => {
                stats.copied += 1;
                on_file(rel, FileOutcome::Copied);
            }
            Ok(false) => {
                stats.skipped += 1;
                on_file(rel, FileOutcome::Skipped);
            }
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "file copy failed");
                failures.push((rel.to_path_buf(), e.to_string()));
                on_file(rel, FileOutcome::Failed);
            }
        }
    })?;

    if failures.is_empty() {
        Ok(stats)
    } else {
        Err(MirrorError::Copies { stats, failures })
    }
}

/// Count regular files under each root, for use as a progress
/// denominator. Roots that do not exist contribute zero.
pub fn count_files(roots: &[&Path]) -> Result<u64, MirrorError> {
    let mut total = 0u64;
    for root in roots {
        if !root.exists() {
            continue;
        }
        visit(root, &mut |_| total += 1)?;
    }
    Ok(total)
}

/// Visit every regular file under `root`, depth-first. Symlinks are not
/// followed.
fn visit(root: &Path, f: &mut dyn FnMut(&Path)) -> Result<(), MirrorError> {
    let entries = fs::read_dir(root).map_err(|source| MirrorError::Walk {
        path: root.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| MirrorError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|source| MirrorError::Walk {
            path: path.clone(),
            source,
        })?;
        if file_type.is_dir() {
            visit(&path, f)?;
        } else if file_type.is_file() {
            f(&path);
        }
    }
    Ok(())
}

/// Bring `dst` in line with `src`. Returns whether a copy happened.
///
/// Decision order: missing destination, then size, then SHA-256. The
/// hash comparison only runs for same-size pairs, so an unchanged tree
/// costs two reads per file and no writes.
fn sync_file(src: &Path, dst: &Path) -> io::Result<bool> {
    if dst.exists() {
        let src_len = fs::metadata(src)?.len();
        let dst_len = fs::metadata(dst)?.len();
        if src_len == dst_len && sha256_file(src)? == sha256_file(dst)? {
            return Ok(false);
        }
    }
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    copy_file(src, dst)?;
    Ok(true)
}

#[cfg(unix)]
fn copy_file(src: &Path, dst: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::copy(src, dst)?;

    // Normalize modes: executables (by bit or by `.sh` suffix) get 0755,
    // everything else 0644.
    let src_mode = fs::metadata(src)?.permissions().mode();
    let is_script = src
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("sh"));
    let mode = if src_mode & 0o111 != 0 || is_script {
        0o755
    } else {
        0o644
    };
    fs::set_permissions(dst, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn copy_file(src: &Path, dst: &Path) -> io::Result<()> {
    // Windows: fs::copy preserves the source attributes.
    fs::copy(src, dst).map(|_| ())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
