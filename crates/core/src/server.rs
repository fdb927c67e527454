// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable server records.
//!
//! A `ServerRecord` is the identity and configuration of one managed
//! server, stable across restarts of the control plane. Transient runtime
//! state lives in the engine, not here.

use crate::component::Channel;
use serde::{Deserialize, Serialize};

/// Sidecar port used when a record has neither an override nor a usable
/// game port.
pub const FALLBACK_SIDECAR_PORT: u16 = 8081;

/// Core start parameters. Changing any of these between runs sets the
/// pending-purge flag on the record, consumed at the next start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartParams {
    pub world_id: String,
    pub start_condition: String,
    pub start_location: String,
    pub difficulty: String,
    pub language: String,
}

impl Default for StartParams {
    fn default() -> Self {
        Self {
            world_id: String::new(),
            start_condition: "Default".to_string(),
            start_location: "Default".to_string(),
            difficulty: "Normal".to_string(),
            language: "english".to_string(),
        }
    }
}

/// Durable identity and configuration of one managed server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerRecord {
    /// Stable integer id; unique across the fleet.
    pub id: u32,
    /// Display name; also used as the save-file name in the start vector.
    pub name: String,
    /// Game port; unique across the fleet, including sidecar ports.
    pub port: u16,
    pub channel: Channel,

    // Automation toggles
    #[serde(default)]
    pub auto_start: bool,
    #[serde(default)]
    pub auto_update: bool,
    #[serde(default = "default_true")]
    pub auto_save: bool,
    #[serde(default)]
    pub auto_pause: bool,
    #[serde(default)]
    pub player_saves: bool,
    #[serde(default)]
    pub delete_skeleton_on_decay: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub steam_p2p: bool,
    #[serde(default)]
    pub detached: bool,
    #[serde(default)]
    pub notify_events: bool,

    #[serde(default = "default_disconnect_timeout")]
    pub disconnect_timeout_ms: u32,
    #[serde(default = "default_save_interval")]
    pub save_interval_secs: u32,
    #[serde(default = "default_max_players")]
    pub max_players: u32,
    #[serde(default = "default_one")]
    pub max_autosaves: u32,
    #[serde(default = "default_one")]
    pub max_quicksaves: u32,
    #[serde(default)]
    pub restart_delay_secs: u64,
    #[serde(default = "default_shutdown_delay")]
    pub shutdown_delay_secs: u64,
    #[serde(default = "default_welcome_delay")]
    pub welcome_delay_secs: u64,

    #[serde(default)]
    pub welcome: String,
    #[serde(default)]
    pub welcome_back: String,

    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub auth_secret: String,

    /// Ordered mod identifiers; order is load order.
    #[serde(default)]
    pub mods: Vec<String>,

    /// Sidecar listener port override. When absent the port is detected
    /// from the plugin log, falling back to `port + 1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidecar_port_override: Option<u16>,

    /// Set when core start parameters change; consumed (and logged) at the
    /// next start. Save data is never deleted.
    #[serde(default)]
    pub pending_save_purge: bool,

    /// Sidecar port parsed from the plugin log, cached per process.
    #[serde(skip)]
    pub sidecar_port_cached: Option<u16>,

    /// Core start parameters; last so the fleet file renders its table
    /// after the scalar settings.
    #[serde(default)]
    pub start: StartParams,
}

fn default_true() -> bool {
    true
}

fn default_one() -> u32 {
    1
}

fn default_disconnect_timeout() -> u32 {
    10_000
}

fn default_save_interval() -> u32 {
    300
}

fn default_max_players() -> u32 {
    10
}

fn default_shutdown_delay() -> u64 {
    30
}

fn default_welcome_delay() -> u64 {
    5
}

impl ServerRecord {
    /// New record with defaults for everything but identity.
    pub fn new(id: u32, name: impl Into<String>, port: u16, channel: Channel) -> Self {
        Self {
            id,
            name: name.into(),
            port,
            channel,
            start: StartParams::default(),
            auto_start: false,
            auto_update: false,
            auto_save: true,
            auto_pause: false,
            player_saves: false,
            delete_skeleton_on_decay: false,
            visible: true,
            steam_p2p: false,
            detached: false,
            notify_events: false,
            disconnect_timeout_ms: default_disconnect_timeout(),
            save_interval_secs: default_save_interval(),
            max_players: default_max_players(),
            max_autosaves: 1,
            max_quicksaves: 1,
            restart_delay_secs: 0,
            shutdown_delay_secs: default_shutdown_delay(),
            welcome_delay_secs: default_welcome_delay(),
            welcome: String::new(),
            welcome_back: String::new(),
            password: String::new(),
            auth_secret: String::new(),
            mods: Vec::new(),
            sidecar_port_override: None,
            pending_save_purge: false,
            sidecar_port_cached: None,
        }
    }

    /// The configured sidecar port: the override when present, otherwise a
    /// previously detected port, otherwise `port + 1`, otherwise the
    /// fallback for records with no usable game port.
    pub fn sidecar_port(&self) -> u16 {
        if let Some(port) = self.sidecar_port_override {
            return port;
        }
        if let Some(port) = self.sidecar_port_cached {
            return port;
        }
        match self.port.checked_add(1) {
            Some(p) if self.port != 0 => p,
            _ => FALLBACK_SIDECAR_PORT,
        }
    }

    /// Replace the core start parameters, setting the pending-purge flag
    /// when anything actually changed.
    pub fn set_start_params(&mut self, params: StartParams) {
        if self.start != params {
            self.start = params;
            self.pending_save_purge = true;
        }
    }

    /// Consume the pending-purge flag, returning whether it was set.
    pub fn take_pending_save_purge(&mut self) -> bool {
        std::mem::take(&mut self.pending_save_purge)
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
