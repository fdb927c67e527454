// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Well-known locations under the control plane's root directory.
//!
//! Everything is a pure function from the root: shared artifacts live
//! under `shared/`, per-server trees under `servers/<id>/`, and the
//! daemon's own state under `state/` and `logs/`.

use qm_core::Channel;
use std::path::{Path, PathBuf};

/// Name of the server executable inside a game dir.
#[cfg(windows)]
pub const SERVER_EXE: &str = "GameServer.exe";
#[cfg(not(windows))]
pub const SERVER_EXE: &str = "GameServer.x86_64";

/// Shell wrapper the plugin framework installs beside the executable.
pub const FRAMEWORK_WRAPPER: &str = "run_bepinex.sh";

/// Path derivations from a single root directory.
#[derive(Debug, Clone)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // --- shared artifact tree ---

    pub fn shared_dir(&self) -> PathBuf {
        self.root.join("shared")
    }

    pub fn steamcmd_dir(&self) -> PathBuf {
        self.shared_dir().join("steamcmd")
    }

    pub fn channel_dir(&self, channel: Channel) -> PathBuf {
        self.shared_dir().join("channels").join(channel.dir_name())
    }

    pub fn bepinex_dir(&self) -> PathBuf {
        self.shared_dir().join("bepinex")
    }

    pub fn launchpad_dir(&self) -> PathBuf {
        self.shared_dir().join("launchpad")
    }

    pub fn relay_dir(&self) -> PathBuf {
        self.shared_dir().join("relay")
    }

    /// Channel build-id marker written by the installer.
    pub fn channel_build_id_path(&self, channel: Channel) -> PathBuf {
        self.channel_dir(channel).join("build_id.txt")
    }

    /// Game-data directory scanned by the catalog.
    pub fn channel_data_dir(&self, channel: Channel) -> PathBuf {
        self.channel_dir(channel).join("data")
    }

    pub fn worlds_dir(&self, channel: Channel) -> PathBuf {
        self.channel_data_dir(channel).join("worlds")
    }

    pub fn difficulties_path(&self, channel: Channel) -> PathBuf {
        self.channel_data_dir(channel).join("difficulties.json")
    }

    pub fn languages_dir(&self, channel: Channel) -> PathBuf {
        self.channel_data_dir(channel).join("languages")
    }

    // --- per-server trees ---

    pub fn servers_dir(&self) -> PathBuf {
        self.root.join("servers")
    }

    pub fn server_root(&self, id: u32) -> PathBuf {
        self.servers_dir().join(id.to_string())
    }

    pub fn game_dir(&self, id: u32) -> PathBuf {
        self.server_root(id).join("game")
    }

    pub fn save_dir(&self, id: u32) -> PathBuf {
        self.server_root(id).join("saves")
    }

    pub fn settings_path(&self, id: u32) -> PathBuf {
        self.server_root(id).join("settings.cfg")
    }

    pub fn log_dir(&self, id: u32) -> PathBuf {
        self.server_root(id).join("logs")
    }

    /// The file passed to the child via `-logFile` and tailed afterwards.
    pub fn server_log_path(&self, id: u32) -> PathBuf {
        self.log_dir(id).join("output.log")
    }

    /// Canonical per-server player session log.
    pub fn roster_path(&self, id: u32) -> PathBuf {
        self.log_dir(id).join("players.log")
    }

    pub fn blacklist_path(&self, id: u32) -> PathBuf {
        self.server_root(id).join("blacklist.txt")
    }

    pub fn server_exe_path(&self, id: u32) -> PathBuf {
        self.game_dir(id).join(SERVER_EXE)
    }

    pub fn framework_wrapper_path(&self, id: u32) -> PathBuf {
        self.game_dir(id).join(FRAMEWORK_WRAPPER)
    }

    /// Plugin framework tree inside a server's game dir.
    pub fn server_framework_dir(&self, id: u32) -> PathBuf {
        self.game_dir(id).join("BepInEx")
    }

    pub fn server_plugins_dir(&self, id: u32) -> PathBuf {
        self.server_framework_dir(id).join("plugins")
    }

    pub fn server_loader_dir(&self, id: u32) -> PathBuf {
        self.server_plugins_dir(id).join("LaunchPad")
    }

    /// Framework log scanned for the sidecar port.
    pub fn server_framework_log_path(&self, id: u32) -> PathBuf {
        self.server_framework_dir(id).join("LogOutput.log")
    }

    /// Config tree the framework creates on first run.
    pub fn server_framework_config_dir(&self, id: u32) -> PathBuf {
        self.server_framework_dir(id).join("config")
    }

    // --- daemon state ---

    pub fn state_dir(&self) -> PathBuf {
        self.root.join("state")
    }

    pub fn pids_path(&self) -> PathBuf {
        self.state_dir().join("pids.json")
    }

    pub fn records_path(&self) -> PathBuf {
        self.root.join("fleet.toml")
    }

    pub fn daemon_log_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn daemon_log_path(&self) -> PathBuf {
        self.daemon_log_dir().join("qmd.log")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.state_dir().join("qmd.lock")
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
