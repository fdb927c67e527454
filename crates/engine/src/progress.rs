// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thread-safe progress registry.
//!
//! Two maps behind reader/writer locks: component deploy progress and
//! per-server copy progress. The orchestrator and supervisors write;
//! arbitrary readers take deep-copy snapshots in a stable order.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use qm_core::{Component, ProgressEntry, DEPLOY_ORDER};
use serde::Serialize;
use std::collections::BTreeMap;

/// One entry in the wire-shape snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub key: String,
    pub component: String,
    pub display_name: String,
    pub stage: String,
    pub percent: u8,
    pub downloaded: u64,
    pub total: u64,
    pub running: bool,
    pub error: String,
    pub updated_at: DateTime<Utc>,
}

/// Deep-copy snapshot of all progress, in stable order: components in
/// deploy order, then servers by id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub updating: bool,
    pub entries: Vec<ProgressView>,
}

/// Registry of component and per-server progress.
pub struct ProgressRegistry {
    components: RwLock<IndexMap<Component, ProgressEntry>>,
    servers: RwLock<BTreeMap<u32, ProgressEntry>>,
}

impl ProgressRegistry {
    /// Entries exist for every known component from startup onward and
    /// are never destroyed, only reset on begin.
    pub fn new(at: DateTime<Utc>) -> Self {
        let mut components = IndexMap::with_capacity(DEPLOY_ORDER.len());
        for component in DEPLOY_ORDER {
            components.insert(component, ProgressEntry::idle(at));
        }
        Self {
            components: RwLock::new(components),
            servers: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn begin(&self, component: Component, stage: &str, at: DateTime<Utc>) {
        if let Some(entry) = self.components.write().get_mut(&component) {
            entry.begin(stage, at);
        }
    }

    pub fn update(&self, component: Component, stage: &str, downloaded: u64, total: u64, at: DateTime<Utc>) {
        if let Some(entry) = self.components.write().get_mut(&component) {
            entry.update(stage, downloaded, total, at);
        }
    }

    pub fn complete(&self, component: Component, stage: &str, error: Option<&str>, at: DateTime<Utc>) {
        if let Some(entry) = self.components.write().get_mut(&component) {
            entry.complete(stage, error, at);
        }
    }

    pub fn component(&self, component: Component) -> Option<ProgressEntry> {
        self.components.read().get(&component).cloned()
    }

    pub fn server_begin(&self, server_id: u32, stage: &str, at: DateTime<Utc>) {
        self.servers
            .write()
            .entry(server_id)
            .or_insert_with(|| ProgressEntry::idle(at))
            .begin(stage, at);
    }

    /// Per-server entries report files processed / files total.
    pub fn server_update(&self, server_id: u32, stage: &str, files: u64, total: u64, at: DateTime<Utc>) {
        if let Some(entry) = self.servers.write().get_mut(&server_id) {
            entry.update(stage, files, total, at);
        }
    }

    pub fn server_complete(&self, server_id: u32, stage: &str, error: Option<&str>, at: DateTime<Utc>) {
        if let Some(entry) = self.servers.write().get_mut(&server_id) {
            entry.complete(stage, error, at);
        }
    }

    pub fn server(&self, server_id: u32) -> Option<ProgressEntry> {
        self.servers.read().get(&server_id).cloned()
    }

    /// Deep-copy snapshot. `updating` is supplied by the orchestrator
    /// (whether the deploy lock is held).
    pub fn snapshot(&self, updating: bool) -> ProgressSnapshot {
        let mut entries = Vec::new();
        {
            let components = self.components.read();
            for (component, entry) in components.iter() {
                entries.push(view(
                    component.key().to_string(),
                    component.key(),
                    component.display_name().to_string(),
                    entry,
                ));
            }
        }
        {
            let servers = self.servers.read();
            for (id, entry) in servers.iter() {
                entries.push(view(
                    format!("server:{id}"),
                    Component::Servers.key(),
                    format!("Server {id}"),
                    entry,
                ));
            }
        }
        ProgressSnapshot { updating, entries }
    }
}

fn view(key: String, component: &str, display_name: String, entry: &ProgressEntry) -> ProgressView {
    ProgressView {
        key,
        component: component.to_string(),
        display_name,
        stage: entry.stage.clone(),
        percent: entry.percent,
        downloaded: entry.downloaded,
        total: entry.total,
        running: entry.running,
        error: entry.error.clone(),
        updated_at: entry.updated_at,
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
