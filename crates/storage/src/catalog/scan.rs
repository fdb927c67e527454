// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data-file scanners.
//!
//! Worlds are directories each carrying a `world.json` manifest;
//! difficulties are one `difficulties.json` listing; languages are one
//! JSON file per language. Hidden entries are kept (callers filter) but
//! everything is sorted by the priority convention: lower first, missing
//! last.

use super::CatalogError;
use qm_core::catalog::priority_key;
use qm_core::{DifficultyDefinition, LanguageListing, WorldDefinition};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct WorldManifest {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    priority: Option<u32>,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    start_conditions: Vec<String>,
    #[serde(default)]
    start_locations: Vec<String>,
    #[serde(default)]
    image: Option<String>,
}

/// Scan the worlds dir: every subdirectory with a readable `world.json`
/// becomes one definition. Subdirectories without a manifest are skipped
/// with a warning; a missing worlds dir is an empty catalog.
pub fn scan_worlds(dir: &Path) -> Result<Vec<WorldDefinition>, CatalogError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut worlds = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let dir_name = entry.file_name().to_string_lossy().into_owned();
        let manifest_path = entry.path().join("world.json");
        let contents = match fs::read_to_string(&manifest_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(world = %dir_name, error = %e, "world manifest unreadable, skipping");
                continue;
            }
        };
        let manifest: WorldManifest =
            serde_json::from_str(&contents).map_err(|source| CatalogError::Parse {
                path: manifest_path.display().to_string(),
                source,
            })?;
        let display_name = if manifest.name.is_empty() {
            manifest.id.clone()
        } else {
            manifest.name
        };
        worlds.push(WorldDefinition {
            dir_name,
            id: manifest.id,
            display_name,
            priority: manifest.priority,
            hidden: manifest.hidden,
            start_conditions: manifest.start_conditions,
            start_locations: manifest.start_locations,
            image: manifest.image,
        });
    }
    worlds.sort_by_key(|w| priority_key(w.priority, &w.display_name));
    Ok(worlds)
}

#[derive(Debug, Deserialize)]
struct DifficultyManifest {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    priority: Option<u32>,
    #[serde(default)]
    hidden: bool,
}

/// Parse the difficulties listing. Missing file means none.
pub fn scan_difficulties(path: &Path) -> Result<Vec<DifficultyDefinition>, CatalogError> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let manifests: Vec<DifficultyManifest> =
        serde_json::from_str(&contents).map_err(|source| CatalogError::Parse {
            path: path.display().to_string(),
            source,
        })?;
    let mut difficulties: Vec<DifficultyDefinition> = manifests
        .into_iter()
        .map(|m| {
            let display_name = if m.name.is_empty() { m.id.clone() } else { m.name };
            DifficultyDefinition {
                id: m.id,
                display_name,
                priority: m.priority,
                hidden: m.hidden,
            }
        })
        .collect();
    difficulties.sort_by_key(|d| priority_key(d.priority, &d.display_name));
    Ok(difficulties)
}

#[derive(Debug, Deserialize)]
struct LanguageManifest {
    #[serde(default)]
    code: String,
    #[serde(default)]
    name: String,
}

/// Scan the languages dir: one `<code>.json` per language. The file stem
/// is the fallback for both code and display name.
pub fn scan_languages(dir: &Path) -> Result<Vec<LanguageListing>, CatalogError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut languages = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let manifest: LanguageManifest = match fs::read_to_string(&path)
            .ok()
            .and_then(|c| serde_json::from_str(&c).ok())
        {
            Some(m) => m,
            None => {
                tracing::warn!(language = %stem, "language file unreadable, using file stem");
                LanguageManifest {
                    code: String::new(),
                    name: String::new(),
                }
            }
        };
        let code = if manifest.code.is_empty() { stem.clone() } else { manifest.code };
        let display_name = if manifest.name.is_empty() { code.clone() } else { manifest.name };
        languages.push(LanguageListing { code, display_name });
    }
    languages.sort_by(|a, b| a.display_name.to_lowercase().cmp(&b.display_name.to_lowercase()));
    Ok(languages)
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
