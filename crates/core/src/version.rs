// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Version probe results and per-component comparison rules.
//!
//! Probes never return free-form errors: a failure class is one of the
//! reserved sentinels so the planner can treat each class uniformly.

use crate::component::Component;
use serde::{Deserialize, Serialize};

/// Result of probing a component's deployed or latest version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionInfo {
    /// A readable version string.
    Version(String),
    /// Artifact not installed.
    Missing,
    /// Installed but no readable version marker.
    Unknown,
    /// Probe exceeded its deadline.
    Timeout,
    /// Other probe failure.
    Error,
}

impl VersionInfo {
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, VersionInfo::Version(_))
    }

    pub fn as_version(&self) -> Option<&str> {
        match self {
            VersionInfo::Version(v) => Some(v),
            _ => None,
        }
    }

    /// Display label; sentinels render as their class name.
    pub fn label(&self) -> &str {
        match self {
            VersionInfo::Version(v) => v,
            VersionInfo::Missing => "Missing",
            VersionInfo::Unknown => "Unknown",
            VersionInfo::Timeout => "Timeout",
            VersionInfo::Error => "Error",
        }
    }
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether a deployed version string is current with respect to the
/// latest, under the component's upstream release conventions:
///
/// - channels publish opaque build ids compared exactly;
/// - the plugin framework publishes a three-segment semver while the
///   installed marker may carry a fourth segment, so deployed must be
///   prefix-equal to latest;
/// - the loader compares case-insensitively, equal or prefix;
/// - the relay tags releases with an optional leading `v`, compared
///   case-insensitively after stripping it;
/// - the package tool has no remote latest and is always current.
pub fn up_to_date(component: Component, deployed: &str, latest: &str) -> bool {
    match component {
        Component::Release | Component::Beta => deployed == latest,
        Component::BepInEx => prefix_equal(deployed, latest),
        Component::LaunchPad => {
            let d = deployed.to_lowercase();
            let l = latest.to_lowercase();
            prefix_equal(&d, &l)
        }
        Component::CommandRelay => {
            strip_v(deployed).eq_ignore_ascii_case(strip_v(latest))
        }
        Component::SteamCmd | Component::Servers => true,
    }
}

/// `deployed` equals `latest`, or extends it by dot-separated segments.
fn prefix_equal(deployed: &str, latest: &str) -> bool {
    deployed == latest
        || deployed
            .strip_prefix(latest)
            .is_some_and(|rest| rest.starts_with('.'))
}

fn strip_v(version: &str) -> &str {
    version.strip_prefix(['v', 'V']).unwrap_or(version)
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
