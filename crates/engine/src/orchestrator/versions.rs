// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-component version cache.
//!
//! Deployed and latest probe results are cached with a short TTL so the
//! planner is cheap and monotonic between deployments. The orchestrator
//! invalidates a component's entries after deploying it, forcing the
//! next read to re-probe disk.

use parking_lot::RwLock;
use qm_core::{Component, VersionInfo};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default TTL for cached probe results.
pub const VERSION_TTL: Duration = Duration::from_secs(60);

struct Cached {
    info: VersionInfo,
    at: Instant,
}

pub(crate) struct VersionCache {
    deployed: RwLock<HashMap<Component, Cached>>,
    latest: RwLock<HashMap<Component, Cached>>,
    ttl: Duration,
}

impl VersionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            deployed: RwLock::new(HashMap::new()),
            latest: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn deployed(&self, component: Component, now: Instant) -> Option<VersionInfo> {
        self.fresh(&self.deployed, component, now)
    }

    pub fn latest(&self, component: Component, now: Instant) -> Option<VersionInfo> {
        self.fresh(&self.latest, component, now)
    }

    pub fn put_deployed(&self, component: Component, info: VersionInfo, now: Instant) {
        self.deployed.write().insert(component, Cached { info, at: now });
    }

    pub fn put_latest(&self, component: Component, info: VersionInfo, now: Instant) {
        self.latest.write().insert(component, Cached { info, at: now });
    }

    /// Drop both entries so the next read re-probes.
    pub fn invalidate(&self, component: Component) {
        self.deployed.write().remove(&component);
        self.latest.write().remove(&component);
    }

    fn fresh(
        &self,
        map: &RwLock<HashMap<Component, Cached>>,
        component: Component,
        now: Instant,
    ) -> Option<VersionInfo> {
        let guard = map.read();
        let cached = guard.get(&component)?;
        if now.duration_since(cached.at) < self.ttl {
            Some(cached.info.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
#[path = "versions_tests.rs"]
mod tests;
