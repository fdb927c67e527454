// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deployable component identifiers.
//!
//! The component set is closed: every value that crosses a trust boundary
//! (progress wire shape, fleet records, operator requests) is one of these
//! variants. Unknown keys are rejected at parse time.

use serde::{Deserialize, Serialize};

/// One deployable unit of the shared artifact tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    /// Vendored package tool used to install the channels.
    SteamCmd,
    /// Release channel of the game server.
    Release,
    /// Beta channel of the game server.
    Beta,
    /// Plugin framework overlaid onto each server's game dir.
    BepInEx,
    /// Plugin loader installed under the framework's plugins dir.
    LaunchPad,
    /// In-process HTTP command sidecar plugin.
    #[serde(rename = "relay")]
    CommandRelay,
    /// The per-server mirror fan-out; depends on everything above.
    Servers,
}

/// Deployment order for a full update. Leaves first, so later steps may
/// consume artifacts produced by earlier ones; the servers fan-out runs
/// last because it mirrors everything above into per-server roots.
pub const DEPLOY_ORDER: [Component; 7] = [
    Component::SteamCmd,
    Component::Release,
    Component::Beta,
    Component::BepInEx,
    Component::LaunchPad,
    Component::CommandRelay,
    Component::Servers,
];

impl Component {
    /// Stable lowercase key used in wire shapes and operator requests.
    pub fn key(&self) -> &'static str {
        match self {
            Component::SteamCmd => "steamcmd",
            Component::Release => "release",
            Component::Beta => "beta",
            Component::BepInEx => "bepinex",
            Component::LaunchPad => "launchpad",
            Component::CommandRelay => "relay",
            Component::Servers => "servers",
        }
    }

    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Component::SteamCmd => "SteamCMD",
            Component::Release => "Release channel",
            Component::Beta => "Beta channel",
            Component::BepInEx => "BepInEx",
            Component::LaunchPad => "LaunchPad loader",
            Component::CommandRelay => "Command relay",
            Component::Servers => "Game servers",
        }
    }

    /// Parse a stable key back into a component. `None` for unknown keys.
    pub fn from_key(key: &str) -> Option<Self> {
        DEPLOY_ORDER.iter().copied().find(|c| c.key() == key)
    }

    /// The channel this component installs, if it is a channel.
    pub fn channel(&self) -> Option<Channel> {
        match self {
            Component::Release => Some(Channel::Release),
            Component::Beta => Some(Channel::Beta),
            _ => None,
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// What an operator asked the orchestrator to deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every component, in [`DEPLOY_ORDER`].
    All,
    /// A single component.
    One(Component),
    /// An explicit ordered set (used by planned deploys).
    Set(Vec<Component>),
}

impl Selection {
    /// Expand the selection into the ordered component list to run.
    pub fn components(&self) -> Vec<Component> {
        match self {
            Selection::All => DEPLOY_ORDER.to_vec(),
            Selection::One(c) => vec![*c],
            Selection::Set(cs) => cs.clone(),
        }
    }

    /// Parse an operator-supplied key; `"all"` selects everything.
    pub fn from_key(key: &str) -> Option<Self> {
        if key == "all" {
            return Some(Selection::All);
        }
        Component::from_key(key).map(Selection::One)
    }
}

/// One of the two parallel installation lines of the game binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Release,
    Beta,
}

impl Channel {
    /// Directory name of this channel under the shared artifact root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Channel::Release => "release",
            Channel::Beta => "beta",
        }
    }

    /// Literal used by the `{beta}` chat token.
    pub fn token(&self) -> &'static str {
        self.dir_name()
    }

    /// The component that installs this channel.
    pub fn component(&self) -> Component {
        match self {
            Channel::Release => Component::Release,
            Channel::Beta => Component::Beta,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[cfg(test)]
#[path = "component_tests.rs"]
mod tests;
