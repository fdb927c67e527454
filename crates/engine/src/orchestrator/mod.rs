// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deployment orchestrator.
//!
//! The exclusive writer over the shared artifact tree. One instance per
//! process, shared by explicit reference; a single deploy lock makes
//! concurrent deployments fail fast rather than interleave. Each
//! component step reports progress, and its caches are invalidated
//! whether the step succeeded or failed so stale "deployed" reads never
//! survive a deployment.

mod versions;

pub use versions::VERSION_TTL;

use crate::fleet::Fleet;
use crate::progress::{ProgressRegistry, ProgressSnapshot};
use parking_lot::Mutex;
use qm_adapters::installer::ComponentInstaller;
use qm_adapters::notify::NotifyAdapter;
use qm_adapters::probes::{DeployedProbe, LatestProbe};
use qm_core::version::up_to_date;
use qm_core::{Clock, Component, Selection, VersionInfo, DEPLOY_ORDER};
use qm_storage::{CatalogCache, Paths};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;
use versions::VersionCache;

#[derive(Debug, Error)]
pub enum DeployError {
    /// A deployment is already in flight; callers retry later.
    #[error("a deployment is already running")]
    AlreadyRunning,
    /// The run finished; one or more components failed.
    #[error("deployment finished with errors: {0}")]
    Failed(String),
}

/// Process-wide deploy exclusion. Test-and-set begin; the guard clears
/// the flag on drop so every exit path releases.
struct DeployLock {
    running: Mutex<bool>,
}

struct DeployGuard {
    lock: Arc<DeployLock>,
}

impl DeployLock {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            running: Mutex::new(false),
        })
    }

    fn try_begin(self: &Arc<Self>) -> Result<DeployGuard, DeployError> {
        let mut running = self.running.lock();
        if *running {
            return Err(DeployError::AlreadyRunning);
        }
        *running = true;
        Ok(DeployGuard {
            lock: Arc::clone(self),
        })
    }

    fn is_running(&self) -> bool {
        *self.running.lock()
    }
}

impl Drop for DeployGuard {
    fn drop(&mut self) {
        *self.lock.running.lock() = false;
    }
}

/// Everything the orchestrator collaborates with.
pub struct OrchestratorDeps<N: NotifyAdapter, C: Clock> {
    pub paths: Paths,
    pub clock: C,
    pub notify: N,
    pub registry: Arc<ProgressRegistry>,
    pub installer: Arc<dyn ComponentInstaller>,
    pub deployed: Arc<dyn DeployedProbe>,
    pub latest: Arc<dyn LatestProbe>,
    pub catalog: Arc<CatalogCache<C>>,
    pub fleet: Arc<Fleet<N, C>>,
}

/// The deployment orchestrator. See the module docs.
pub struct Orchestrator<N: NotifyAdapter, C: Clock> {
    paths: Paths,
    clock: C,
    notify: N,
    registry: Arc<ProgressRegistry>,
    installer: Arc<dyn ComponentInstaller>,
    deployed: Arc<dyn DeployedProbe>,
    latest: Arc<dyn LatestProbe>,
    catalog: Arc<CatalogCache<C>>,
    fleet: Arc<Fleet<N, C>>,
    lock: Arc<DeployLock>,
    versions: VersionCache,
    last_errors: Mutex<Vec<String>>,
    missing: Mutex<Vec<Component>>,
    /// Self-handle for background deployments.
    me: std::sync::Weak<Self>,
}

impl<N: NotifyAdapter, C: Clock> Orchestrator<N, C> {
    pub fn new(deps: OrchestratorDeps<N, C>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            paths: deps.paths,
            clock: deps.clock,
            notify: deps.notify,
            registry: deps.registry,
            installer: deps.installer,
            deployed: deps.deployed,
            latest: deps.latest,
            catalog: deps.catalog,
            fleet: deps.fleet,
            lock: DeployLock::new(),
            versions: VersionCache::new(VERSION_TTL),
            last_errors: Mutex::new(Vec::new()),
            missing: Mutex::new(Vec::new()),
            me: me.clone(),
        })
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub fn registry(&self) -> Arc<ProgressRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn catalog(&self) -> Arc<CatalogCache<C>> {
        Arc::clone(&self.catalog)
    }

    /// Deploy a selection synchronously under the deploy lock.
    pub async fn deploy(&self, selection: Selection) -> Result<(), DeployError> {
        let guard = self.lock.try_begin()?;
        let errors = self.run_sequence(selection.components()).await;
        drop(guard);
        self.finish(errors)
    }

    /// Begin a deployment and return immediately. The lock is taken
    /// before returning, so a second call fails fast.
    pub fn deploy_async(&self, selection: Selection) -> Result<(), DeployError> {
        let guard = self.lock.try_begin()?;
        let Some(this) = self.me.upgrade() else {
            return Ok(());
        };
        tokio::spawn(async move {
            let errors = this.run_sequence(selection.components()).await;
            drop(guard);
            if let Err(e) = this.finish(errors) {
                tracing::warn!(error = %e, "background deployment finished with errors");
            }
        });
        Ok(())
    }

    /// Deploy a previously planned component list under one lock.
    pub async fn deploy_plan(&self, plan: Vec<Component>) -> Result<(), DeployError> {
        if plan.is_empty() {
            return Ok(());
        }
        let guard = self.lock.try_begin()?;
        let errors = self.run_sequence(plan).await;
        drop(guard);
        self.finish(errors)
    }

    /// The ordered list of components judged out of date.
    ///
    /// Channels missing on disk are planned as installs; other sentinel
    /// probe results are skipped; versioned components compare deployed
    /// against latest under the component's own rule. Any planned work
    /// appends the servers fan-out so per-server mirrors pick up the new
    /// artifacts.
    pub async fn plan(&self) -> Vec<Component> {
        let mut plan = Vec::new();
        let mut missing = Vec::new();

        for component in DEPLOY_ORDER {
            if component == Component::Servers {
                continue;
            }
            let deployed = self.deployed_version(component).await;
            match deployed {
                VersionInfo::Missing => {
                    missing.push(component);
                    if component.channel().is_some() {
                        plan.push(component);
                    }
                }
                VersionInfo::Unknown | VersionInfo::Timeout | VersionInfo::Error => {}
                VersionInfo::Version(installed) => {
                    // The package tool has no remote latest.
                    if component == Component::SteamCmd {
                        continue;
                    }
                    if let VersionInfo::Version(latest) = self.latest_version(component).await {
                        if !up_to_date(component, &installed, &latest) {
                            plan.push(component);
                        }
                    }
                }
            }
        }

        *self.missing.lock() = missing;
        if !plan.is_empty() {
            plan.push(Component::Servers);
        }
        plan
    }

    /// Progress snapshot plus whether a deployment is in flight.
    pub fn progress_snapshot(&self) -> ProgressSnapshot {
        self.registry.snapshot(self.lock.is_running())
    }

    /// Aggregated errors of the most recent deployment.
    pub fn deploy_errors(&self) -> Vec<String> {
        self.last_errors.lock().clone()
    }

    /// Components whose deployed probe last returned `Missing`.
    pub fn missing_components(&self) -> Vec<Component> {
        self.missing.lock().clone()
    }

    /// Cached read-through of a component's deployed version.
    pub async fn deployed_version(&self, component: Component) -> VersionInfo {
        if let Some(hit) = self.versions.deployed(component, self.clock.now()) {
            return hit;
        }
        let info = self.deployed.deployed(component).await;
        self.versions.put_deployed(component, info.clone(), self.clock.now());
        info
    }

    /// Cached read-through of a component's latest version.
    pub async fn latest_version(&self, component: Component) -> VersionInfo {
        if let Some(hit) = self.versions.latest(component, self.clock.now()) {
            return hit;
        }
        let info = self.latest.latest(component).await;
        self.versions.put_latest(component, info.clone(), self.clock.now());
        info
    }

    // --- internals ---

    fn finish(&self, errors: Vec<String>) -> Result<(), DeployError> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(DeployError::Failed(errors.join("; ")))
        }
    }

    async fn run_sequence(&self, components: Vec<Component>) -> Vec<String> {
        let run_id = Uuid::new_v4();
        tracing::info!(%run_id, ?components, "deployment started");
        let mut errors: Vec<String> = Vec::new();

        for component in components {
            if component == Component::Servers {
                self.deploy_servers(&mut errors).await;
                continue;
            }
            self.deploy_component(component, &mut errors).await;
        }

        self.refresh_missing().await;
        *self.last_errors.lock() = errors.clone();

        let summary = if errors.is_empty() {
            "all components updated".to_string()
        } else {
            format!("{} component(s) failed", errors.len())
        };
        tracing::info!(%run_id, errors = errors.len(), "deployment finished");
        let _ = self.notify.notify("Deployment finished", &summary).await;
        errors
    }

    async fn deploy_component(&self, component: Component, errors: &mut Vec<String>) {
        let _ = self
            .notify
            .notify("Deploy started", component.display_name())
            .await;
        self.registry.begin(component, "Queued", self.clock.utc());

        let registry = Arc::clone(&self.registry);
        let clock = self.clock.clone();
        let callback = move |stage: &str, downloaded: u64, total: u64| {
            registry.update(component, stage, downloaded, total, clock.utc());
        };
        let result = self.installer.install(component, &callback).await;

        match result {
            Ok(()) => {
                self.registry
                    .complete(component, "Completed", None, self.clock.utc());
                let _ = self
                    .notify
                    .notify("Deploy finished", component.display_name())
                    .await;
            }
            Err(e) => {
                let message = e.to_string();
                self.registry
                    .complete(component, "Failed", Some(&message), self.clock.utc());
                errors.push(format!("{}: {}", component.key(), message));
                let _ = self
                    .notify
                    .notify(
                        "Deploy failed",
                        &format!("{}: {}", component.display_name(), message),
                    )
                    .await;
            }
        }

        // Caches are invalidated even on failure so a stale "deployed"
        // answer never survives a deployment attempt.
        self.invalidate(component);
    }

    /// The servers fan-out: mirror shared artifacts into every server's
    /// game dir, collecting failures without aborting the rest.
    async fn deploy_servers(&self, errors: &mut Vec<String>) {
        self.registry.begin(Component::Servers, "Copying", self.clock.utc());
        let supervisors = self.fleet.all();
        let total = supervisors.len() as u64;
        let mut failed = 0usize;

        for (index, supervisor) in supervisors.into_iter().enumerate() {
            if let Err(e) = supervisor.deploy().await {
                failed += 1;
                errors.push(format!("server {}: {}", supervisor.id(), e));
            }
            self.registry.update(
                Component::Servers,
                "Copying",
                index as u64 + 1,
                total,
                self.clock.utc(),
            );
        }

        if failed == 0 {
            self.registry
                .complete(Component::Servers, "Completed", None, self.clock.utc());
        } else {
            let message = format!("{failed} server(s) failed");
            self.registry
                .complete(Component::Servers, "Failed", Some(&message), self.clock.utc());
        }
    }

    fn invalidate(&self, component: Component) {
        self.versions.invalidate(component);
        if let Some(channel) = component.channel() {
            self.catalog.invalidate_channel(channel);
        }
    }

    /// Re-probe what is missing on disk; runs after every deployment and
    /// as part of planning.
    async fn refresh_missing(&self) {
        let mut missing = Vec::new();
        for component in DEPLOY_ORDER {
            if component == Component::Servers {
                continue;
            }
            if self.deployed_version(component).await == VersionInfo::Missing {
                missing.push(component);
            }
        }
        *self.missing.lock() = missing;
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
