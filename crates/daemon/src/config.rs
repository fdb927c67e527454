// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration.
//!
//! The root directory comes from `QM_ROOT` (falling back to the
//! platform data dir); everything else is an optional `qmd.toml` at the
//! root. Missing file means defaults.

use qm_adapters::installer::ArtifactSources;
use qm_adapters::probes::LatestEndpoints;
use qm_storage::Paths;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config unreadable: {0}")]
    Io(#[from] std::io::Error),
    #[error("config malformed: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    /// Run `plan()` on this interval and deploy the result. Absent or
    /// zero disables the tick.
    update_interval_secs: Option<u64>,
    /// Deploy the startup plan before starting servers.
    deploy_on_start: bool,
    /// Send desktop notifications (headless installs leave this off).
    desktop_notifications: bool,
    sources: SourcesSection,
    latest: LatestSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SourcesSection {
    steamcmd_url: Option<String>,
    app_id: Option<u32>,
    beta_branch: Option<String>,
    bepinex_url: Option<String>,
    launchpad_url: Option<String>,
    launchpad_version: Option<String>,
    relay_url: Option<String>,
    relay_version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LatestSection {
    release: Option<String>,
    beta: Option<String>,
    bepinex: Option<String>,
    launchpad: Option<String>,
    relay: Option<String>,
}

/// Resolved daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub update_interval_secs: Option<u64>,
    pub deploy_on_start: bool,
    pub desktop_notifications: bool,
    pub sources: ArtifactSources,
    pub endpoints: LatestEndpoints,
}

impl Config {
    /// Load from `QM_ROOT` (or the platform data dir) plus an optional
    /// `qmd.toml` under that root.
    pub fn load() -> Result<Self, ConfigError> {
        let root = match std::env::var_os("QM_ROOT") {
            Some(root) => PathBuf::from(root),
            None => dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("quartermaster"),
        };
        Self::load_from(root)
    }

    pub fn load_from(root: PathBuf) -> Result<Self, ConfigError> {
        let file_path = root.join("qmd.toml");
        let file: ConfigFile = match std::fs::read_to_string(&file_path) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ConfigFile::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            root,
            update_interval_secs: file.update_interval_secs.filter(|&secs| secs > 0),
            deploy_on_start: file.deploy_on_start,
            desktop_notifications: file.desktop_notifications,
            sources: ArtifactSources {
                steamcmd_url: file.sources.steamcmd_url,
                app_id: file.sources.app_id,
                beta_branch: file.sources.beta_branch,
                bepinex_url: file.sources.bepinex_url,
                launchpad_url: file.sources.launchpad_url,
                launchpad_version: file.sources.launchpad_version,
                relay_url: file.sources.relay_url,
                relay_version: file.sources.relay_version,
            },
            endpoints: LatestEndpoints {
                release: file.latest.release,
                beta: file.latest.beta,
                bepinex: file.latest.bepinex,
                launchpad: file.latest.launchpad,
                relay: file.latest.relay,
            },
        })
    }

    pub fn paths(&self) -> Paths {
        Paths::new(self.root.clone())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
