// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Game-data catalog value types.
//!
//! Scanned from data files under a channel's artifact root and cached by
//! the storage layer; these are the plain values the scanners produce.

use serde::{Deserialize, Serialize};

/// One startable world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldDefinition {
    /// Directory name under the channel's worlds dir.
    pub dir_name: String,
    /// Stable world id used in start parameters.
    pub id: String,
    /// Localized display name; falls back to the id.
    pub display_name: String,
    /// Lower sorts first; absent sorts last.
    pub priority: Option<u32>,
    pub hidden: bool,
    pub start_conditions: Vec<String>,
    pub start_locations: Vec<String>,
    pub image: Option<String>,
}

/// One difficulty preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyDefinition {
    pub id: String,
    pub display_name: String,
    pub priority: Option<u32>,
    pub hidden: bool,
}

/// One installed language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageListing {
    /// Stable code, e.g. `english`.
    pub code: String,
    pub display_name: String,
}

/// Sort key honoring the priority convention: lower first, missing last,
/// ties broken by display name.
pub fn priority_key(priority: Option<u32>, display_name: &str) -> (u32, String) {
    (priority.unwrap_or(u32::MAX), display_name.to_lowercase())
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
