// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deployed-version probe over the shared artifact tree.
//!
//! Per component: the install dir missing means `Missing`; a dir without
//! a readable version marker means `Unknown`. Marker files are written by
//! the installer next to each artifact.

use super::DeployedProbe;
use async_trait::async_trait;
use qm_core::{Component, VersionInfo};
use qm_storage::Paths;
use serde_json::Value;
use std::path::PathBuf;

/// Reads version markers from the shared artifact tree.
#[derive(Clone)]
pub struct DiskProbe {
    paths: Paths,
}

impl DiskProbe {
    pub fn new(paths: Paths) -> Self {
        Self { paths }
    }

    async fn probe(&self, component: Component) -> VersionInfo {
        match component {
            Component::SteamCmd => {
                // The tool has no version marker: present or not.
                if steamcmd_exe(&self.paths).exists() {
                    VersionInfo::Unknown
                } else {
                    VersionInfo::Missing
                }
            }
            Component::Release | Component::Beta => {
                let channel = match component.channel() {
                    Some(c) => c,
                    None => return VersionInfo::Error,
                };
                if !self.paths.channel_dir(channel).exists() {
                    return VersionInfo::Missing;
                }
                read_marker(self.paths.channel_build_id_path(channel)).await
            }
            Component::BepInEx => {
                if !self.paths.bepinex_dir().exists() {
                    return VersionInfo::Missing;
                }
                read_marker(self.paths.bepinex_dir().join("version.txt")).await
            }
            Component::LaunchPad => {
                if !self.paths.launchpad_dir().exists() {
                    return VersionInfo::Missing;
                }
                read_manifest_version(self.paths.launchpad_dir().join("manifest.json")).await
            }
            Component::CommandRelay => {
                if !self.paths.relay_dir().exists() {
                    return VersionInfo::Missing;
                }
                read_marker(self.paths.relay_dir().join("version.txt")).await
            }
            // The servers fan-out has no version of its own.
            Component::Servers => VersionInfo::Unknown,
        }
    }
}

#[async_trait]
impl DeployedProbe for DiskProbe {
    async fn deployed(&self, component: Component) -> VersionInfo {
        match tokio::time::timeout(crate::env::probe_timeout(), self.probe(component)).await {
            Ok(info) => info,
            Err(_) => {
                tracing::warn!(component = %component, "deployed-version probe timed out");
                VersionInfo::Timeout
            }
        }
    }
}

fn steamcmd_exe(paths: &Paths) -> PathBuf {
    #[cfg(windows)]
    {
        paths.steamcmd_dir().join("steamcmd.exe")
    }
    #[cfg(not(windows))]
    {
        paths.steamcmd_dir().join("steamcmd.sh")
    }
}

async fn read_marker(path: PathBuf) -> VersionInfo {
    match tokio::fs::read_to_string(&path).await {
        Ok(contents) => {
            let version = contents.trim();
            if version.is_empty() {
                VersionInfo::Unknown
            } else {
                VersionInfo::Version(version.to_string())
            }
        }
        Err(_) => VersionInfo::Unknown,
    }
}

async fn read_manifest_version(path: PathBuf) -> VersionInfo {
    let contents = match tokio::fs::read_to_string(&path).await {
        Ok(c) => c,
        Err(_) => return VersionInfo::Unknown,
    };
    match serde_json::from_str::<Value>(&contents) {
        Ok(value) => value
            .get("version")
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(|v| VersionInfo::Version(v.to_string()))
            .unwrap_or(VersionInfo::Unknown),
        Err(_) => VersionInfo::Unknown,
    }
}

#[cfg(test)]
#[path = "disk_tests.rs"]
mod tests;
