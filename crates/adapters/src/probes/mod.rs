// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Version probes.
//!
//! Two pluggable probe surfaces: what is deployed on disk, and what the
//! remote sources consider latest. Failures never surface as errors —
//! each probe maps its failure class onto one of the reserved sentinels
//! in [`VersionInfo`] so planners can treat classes uniformly.

mod disk;
mod http;

pub use disk::DiskProbe;
pub use http::{HttpLatestProbe, LatestEndpoints};

use async_trait::async_trait;
use qm_core::{Component, VersionInfo};

/// Reads the deployed version of a component from local artifacts.
#[async_trait]
pub trait DeployedProbe: Send + Sync + 'static {
    async fn deployed(&self, component: Component) -> VersionInfo;
}

/// Fetches the latest available version of a component from its source.
#[async_trait]
pub trait LatestProbe: Send + Sync + 'static {
    async fn latest(&self, component: Component) -> VersionInfo;
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Scriptable deployed-version probe for tests.
    #[derive(Clone, Default)]
    pub struct FakeDeployedProbe {
        versions: Arc<Mutex<HashMap<Component, VersionInfo>>>,
    }

    impl FakeDeployedProbe {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set(&self, component: Component, info: VersionInfo) {
            self.versions.lock().insert(component, info);
        }
    }

    #[async_trait]
    impl DeployedProbe for FakeDeployedProbe {
        async fn deployed(&self, component: Component) -> VersionInfo {
            self.versions
                .lock()
                .get(&component)
                .cloned()
                .unwrap_or(VersionInfo::Missing)
        }
    }

    /// Scriptable latest-version probe for tests.
    #[derive(Clone, Default)]
    pub struct FakeLatestProbe {
        versions: Arc<Mutex<HashMap<Component, VersionInfo>>>,
    }

    impl FakeLatestProbe {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set(&self, component: Component, info: VersionInfo) {
            self.versions.lock().insert(component, info);
        }
    }

    #[async_trait]
    impl LatestProbe for FakeLatestProbe {
        async fn latest(&self, component: Component) -> VersionInfo {
            self.versions
                .lock()
                .get(&component)
                .cloned()
                .unwrap_or(VersionInfo::Unknown)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeDeployedProbe, FakeLatestProbe};
