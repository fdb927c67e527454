// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fleet: all supervisors, keyed by server id.

use crate::supervisor::Supervisor;
use parking_lot::RwLock;
use qm_adapters::notify::NotifyAdapter;
use qm_core::Clock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registry of supervisors. Shared by the daemon (lifecycle calls) and
/// the orchestrator (per-server deploy fan-out).
pub struct Fleet<N: NotifyAdapter, C: Clock> {
    supervisors: RwLock<BTreeMap<u32, Arc<Supervisor<N, C>>>>,
}

impl<N: NotifyAdapter, C: Clock> Fleet<N, C> {
    pub fn new() -> Self {
        Self {
            supervisors: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn insert(&self, supervisor: Arc<Supervisor<N, C>>) {
        self.supervisors.write().insert(supervisor.id(), supervisor);
    }

    pub fn get(&self, id: u32) -> Option<Arc<Supervisor<N, C>>> {
        self.supervisors.read().get(&id).cloned()
    }

    pub fn remove(&self, id: u32) -> Option<Arc<Supervisor<N, C>>> {
        self.supervisors.write().remove(&id)
    }

    /// All supervisors in id order.
    pub fn all(&self) -> Vec<Arc<Supervisor<N, C>>> {
        self.supervisors.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.supervisors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.supervisors.read().is_empty()
    }
}

impl<N: NotifyAdapter, C: Clock> Default for Fleet<N, C> {
    fn default() -> Self {
        Self::new()
    }
}
