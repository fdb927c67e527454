// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Component installers.
//!
//! The orchestrator treats installers as opaque collaborators: install
//! one component, report progress through the callback at stage changes
//! and at byte granularity during downloads. The production installer
//! drives SteamCMD for the channels and plain HTTP downloads for the
//! tool and plugins.

use crate::subprocess::{run_with_timeout, UNPACK_TIMEOUT};
use async_trait::async_trait;
use qm_core::{Channel, Component};
use qm_storage::Paths;
use regex::Regex;
use std::path::Path;
use std::process::Stdio;
use std::sync::OnceLock;
use thiserror::Error;
use tokio::io::AsyncBufReadExt;
use tokio::process::Command;

/// Progress callback: `(stage, downloaded, total)`. A zero total means
/// indeterminate.
pub type Progress<'a> = &'a (dyn Fn(&str, u64, u64) + Send + Sync);

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("download failed: {0}")]
    Download(String),
    #[error("{tool}: {message}")]
    Tool { tool: &'static str, message: String },
    #[error("component {0} has no installer")]
    Unsupported(Component),
}

/// Installs one component into the shared artifact tree.
#[async_trait]
pub trait ComponentInstaller: Send + Sync + 'static {
    async fn install(&self, component: Component, progress: Progress<'_>)
        -> Result<(), InstallError>;
}

/// Where the installable artifacts come from.
#[derive(Debug, Clone, Default)]
pub struct ArtifactSources {
    /// SteamCMD archive (tar.gz or zip).
    pub steamcmd_url: Option<String>,
    /// Steam app id of the dedicated server.
    pub app_id: Option<u32>,
    /// Branch key selecting the beta channel in `app_update`.
    pub beta_branch: Option<String>,
    /// Plugin framework archive.
    pub bepinex_url: Option<String>,
    /// Loader payload (archive or single dll) and its version marker.
    pub launchpad_url: Option<String>,
    pub launchpad_version: Option<String>,
    /// Relay payload and its version marker.
    pub relay_url: Option<String>,
    pub relay_version: Option<String>,
}

/// Production installer: SteamCMD for channels, HTTP for everything else.
pub struct SteamInstaller {
    paths: Paths,
    sources: ArtifactSources,
    http: reqwest::Client,
}

impl SteamInstaller {
    pub fn new(paths: Paths, sources: ArtifactSources) -> Self {
        let http = reqwest::Client::builder()
            .timeout(crate::env::install_timeout())
            .build()
            .unwrap_or_default();
        Self {
            paths,
            sources,
            http,
        }
    }

    async fn install_steamcmd(&self, progress: Progress<'_>) -> Result<(), InstallError> {
        let dir = self.paths.steamcmd_dir();
        if steamcmd_exe(&self.paths).exists() {
            progress("Present", 0, 0);
            return Ok(());
        }
        let url = self
            .sources
            .steamcmd_url
            .as_deref()
            .ok_or(InstallError::Unsupported(Component::SteamCmd))?;

        tokio::fs::create_dir_all(&dir).await?;
        let archive = dir.join("steamcmd-download");
        self.download(url, &archive, progress).await?;
        progress("Unpacking", 0, 0);
        unpack(&archive, &dir).await?;
        tokio::fs::remove_file(&archive).await.ok();
        Ok(())
    }

    async fn install_channel(&self, channel: Channel, progress: Progress<'_>) -> Result<(), InstallError> {
        let app_id = self
            .sources
            .app_id
            .ok_or(InstallError::Unsupported(channel.component()))?;
        let dir = self.paths.channel_dir(channel);
        tokio::fs::create_dir_all(&dir).await?;

        let mut cmd = Command::new(steamcmd_exe(&self.paths));
        cmd.arg("+force_install_dir").arg(&dir);
        cmd.args(["+login", "anonymous"]);
        cmd.arg("+app_update").arg(app_id.to_string());
        if channel == Channel::Beta {
            if let Some(branch) = &self.sources.beta_branch {
                cmd.args(["-beta", branch]);
            }
        }
        cmd.args(["validate", "+quit"]);
        cmd.stdout(Stdio::piped()).stderr(Stdio::null()).stdin(Stdio::null());

        progress("Updating", 0, 0);
        let mut child = cmd.spawn().map_err(|e| InstallError::Tool {
            tool: "steamcmd",
            message: e.to_string(),
        })?;

        if let Some(stdout) = child.stdout.take() {
            let mut lines = tokio::io::BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some((stage, done, total)) = parse_steamcmd_progress(&line) {
                    progress(stage, done, total);
                }
            }
        }

        let status = tokio::time::timeout(crate::env::install_timeout(), child.wait())
            .await
            .map_err(|_| InstallError::Tool {
                tool: "steamcmd",
                message: "timed out".to_string(),
            })?
            .map_err(|e| InstallError::Tool {
                tool: "steamcmd",
                message: e.to_string(),
            })?;
        if !status.success() {
            return Err(InstallError::Tool {
                tool: "steamcmd",
                message: format!("exited with {status}"),
            });
        }

        // Pin the deployed build id for the disk probe.
        progress("Recording build", 0, 0);
        let manifest = dir.join("steamapps").join(format!("appmanifest_{app_id}.acf"));
        match tokio::fs::read_to_string(&manifest).await {
            Ok(contents) => match parse_acf_build_id(&contents) {
                Some(build_id) => {
                    tokio::fs::write(self.paths.channel_build_id_path(channel), build_id).await?;
                }
                None => {
                    tracing::warn!(channel = %channel, "no buildid in app manifest");
                }
            },
            Err(e) => {
                tracing::warn!(channel = %channel, error = %e, "app manifest unreadable");
            }
        }
        Ok(())
    }

    async fn install_payload(
        &self,
        component: Component,
        url: &str,
        version: Option<&str>,
        target: &Path,
        progress: Progress<'_>,
    ) -> Result<(), InstallError> {
        tokio::fs::create_dir_all(target).await?;
        let is_archive = url.ends_with(".zip") || url.ends_with(".tar.gz") || url.ends_with(".tgz");
        if is_archive {
            let archive = target.join("payload-download");
            self.download(url, &archive, progress).await?;
            progress("Unpacking", 0, 0);
            unpack(&archive, target).await?;
            tokio::fs::remove_file(&archive).await.ok();
        } else {
            let file_name = url.rsplit('/').next().unwrap_or("payload.dll");
            self.download(url, &target.join(file_name), progress).await?;
        }
        if let Some(version) = version {
            let marker = match component {
                Component::LaunchPad => target.join("manifest.json"),
                _ => target.join("version.txt"),
            };
            let contents = match component {
                Component::LaunchPad => {
                    serde_json::json!({ "name": "LaunchPad", "version": version }).to_string()
                }
                _ => version.to_string(),
            };
            tokio::fs::write(marker, contents).await?;
        }
        Ok(())
    }

    async fn download(&self, url: &str, to: &Path, progress: Progress<'_>) -> Result<(), InstallError> {
        use tokio::io::AsyncWriteExt;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| InstallError::Download(e.to_string()))?;
        if !response.status().is_success() {
            return Err(InstallError::Download(format!("status {}", response.status())));
        }
        let total = response.content_length().unwrap_or(0);
        progress("Downloading", 0, total);

        let mut file = tokio::fs::File::create(to).await?;
        let mut downloaded = 0u64;
        let mut response = response;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| InstallError::Download(e.to_string()))?
        {
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            progress("Downloading", downloaded, total);
        }
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl ComponentInstaller for SteamInstaller {
    async fn install(&self, component: Component, progress: Progress<'_>)
        -> Result<(), InstallError> {
        match component {
            Component::SteamCmd => self.install_steamcmd(progress).await,
            Component::Release => self.install_channel(Channel::Release, progress).await,
            Component::Beta => self.install_channel(Channel::Beta, progress).await,
            Component::BepInEx => {
                let url = self
                    .sources
                    .bepinex_url
                    .clone()
                    .ok_or(InstallError::Unsupported(component))?;
                self.install_payload(component, &url, None, &self.paths.bepinex_dir(), progress)
                    .await
            }
            Component::LaunchPad => {
                let url = self
                    .sources
                    .launchpad_url
                    .clone()
                    .ok_or(InstallError::Unsupported(component))?;
                let version = self.sources.launchpad_version.clone();
                self.install_payload(
                    component,
                    &url,
                    version.as_deref(),
                    &self.paths.launchpad_dir(),
                    progress,
                )
                .await
            }
            Component::CommandRelay => {
                let url = self
                    .sources
                    .relay_url
                    .clone()
                    .ok_or(InstallError::Unsupported(component))?;
                let version = self.sources.relay_version.clone();
                self.install_payload(
                    component,
                    &url,
                    version.as_deref(),
                    &self.paths.relay_dir(),
                    progress,
                )
                .await
            }
            // The servers fan-out is driven by the orchestrator itself.
            Component::Servers => Err(InstallError::Unsupported(component)),
        }
    }
}

fn steamcmd_exe(paths: &Paths) -> std::path::PathBuf {
    #[cfg(windows)]
    {
        paths.steamcmd_dir().join("steamcmd.exe")
    }
    #[cfg(not(windows))]
    {
        paths.steamcmd_dir().join("steamcmd.sh")
    }
}

/// Unpack an archive with the system `tar` (handles zip on bsdtar,
/// gzip everywhere).
async fn unpack(archive: &Path, into: &Path) -> Result<(), InstallError> {
    let mut cmd = Command::new("tar");
    cmd.arg("-xf").arg(archive).arg("-C").arg(into);
    let output = run_with_timeout(cmd, UNPACK_TIMEOUT, "unpack")
        .await
        .map_err(|message| InstallError::Tool { tool: "tar", message })?;
    if output.status.success() {
        Ok(())
    } else {
        Err(InstallError::Tool {
            tool: "tar",
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

// Patterns are literals; a failed compile is a programming error.
#[allow(clippy::unwrap_used)]
fn progress_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Update state \(0x\w+\) (\w+), progress: [\d.]+ \((\d+) / (\d+)\)").unwrap()
    })
}

/// Parse one SteamCMD progress line into `(stage, done, total)` bytes.
pub fn parse_steamcmd_progress(line: &str) -> Option<(&str, u64, u64)> {
    let caps = progress_re().captures(line)?;
    let stage = caps.get(1)?.as_str();
    let done = caps.get(2)?.as_str().parse().ok()?;
    let total = caps.get(3)?.as_str().parse().ok()?;
    Some((stage, done, total))
}

// Patterns are literals; a failed compile is a programming error.
#[allow(clippy::unwrap_used)]
fn buildid_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""buildid"\s+"(\d+)""#).unwrap())
}

/// Pull the build id out of a Steam app manifest (.acf).
pub fn parse_acf_build_id(contents: &str) -> Option<&str> {
    buildid_re()
        .captures(contents)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;

    /// Recorded install request.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct InstallCall {
        pub component: Component,
    }

    /// Scriptable installer for tests: records calls, drives the
    /// progress callback, and fails on request.
    #[derive(Clone, Default)]
    pub struct FakeInstaller {
        calls: Arc<Mutex<Vec<InstallCall>>>,
        fail_on: Arc<Mutex<HashSet<Component>>>,
    }

    impl FakeInstaller {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_on(&self, component: Component) {
            self.fail_on.lock().insert(component);
        }

        pub fn calls(&self) -> Vec<InstallCall> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl ComponentInstaller for FakeInstaller {
        async fn install(
            &self,
            component: Component,
            progress: Progress<'_>,
        ) -> Result<(), InstallError> {
            self.calls.lock().push(InstallCall { component });
            progress("Downloading", 0, 100);
            progress("Downloading", 100, 100);
            if self.fail_on.lock().contains(&component) {
                return Err(InstallError::Download("scripted failure".to_string()));
            }
            progress("Installing", 0, 0);
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeInstaller, InstallCall};

#[cfg(test)]
#[path = "installer_tests.rs"]
mod tests;
