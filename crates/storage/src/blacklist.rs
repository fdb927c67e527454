// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-server blacklist: a single comma-separated line of steam ids,
//! insertion-ordered, no duplicates. Add and remove are set operations;
//! rewrites are atomic.

use std::fs;
use std::io;
use std::path::Path;

/// Read the blacklist. Missing file means empty.
pub fn load(path: &Path) -> io::Result<Vec<String>> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    Ok(contents
        .trim()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect())
}

/// Add an id. Idempotent; preserves insertion order.
pub fn add(path: &Path, id: &str) -> io::Result<Vec<String>> {
    let id = id.trim();
    let mut entries = load(path)?;
    if !id.is_empty() && !entries.iter().any(|e| e == id) {
        entries.push(id.to_string());
        store(path, &entries)?;
    }
    Ok(entries)
}

/// Remove an id. Removing an absent id is a no-op.
pub fn remove(path: &Path, id: &str) -> io::Result<Vec<String>> {
    let id = id.trim();
    let mut entries = load(path)?;
    let before = entries.len();
    entries.retain(|e| e != id);
    if entries.len() != before {
        store(path, &entries)?;
    }
    Ok(entries)
}

fn store(path: &Path, entries: &[String]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, entries.join(","))?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
#[path = "blacklist_tests.rs"]
mod tests;
