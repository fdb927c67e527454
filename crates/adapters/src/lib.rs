// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O

mod env;
pub mod installer;
pub mod notify;
pub mod probes;
pub mod process;
pub mod sidecar;
pub mod subprocess;

pub use installer::{ArtifactSources, ComponentInstaller, InstallError, SteamInstaller};
pub use notify::{DesktopNotifyAdapter, NoOpNotifyAdapter, NotifyAdapter};
pub use probes::{DeployedProbe, DiskProbe, HttpLatestProbe, LatestEndpoints, LatestProbe};
pub use sidecar::{detect_sidecar_port, SidecarClient, SidecarError};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use installer::{FakeInstaller, InstallCall};
#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifyAdapter, NotifyCall};
#[cfg(any(test, feature = "test-support"))]
pub use probes::{FakeDeployedProbe, FakeLatestProbe};
