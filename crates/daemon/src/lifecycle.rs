// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and restart reconciliation.
//!
//! Startup wires one orchestrator and one supervisor per fleet record,
//! re-attaches server processes that outlived the previous daemon, runs
//! the optional startup deployment, auto-starts servers, and arms the
//! update tick.

use crate::config::Config;
use crate::notify::DaemonNotify;
use qm_adapters::installer::SteamInstaller;
use qm_adapters::probes::{DiskProbe, HttpLatestProbe};
use qm_adapters::process::pid_alive;
use qm_adapters::sidecar::SidecarClient;
use qm_core::{Clock, SystemClock};
use qm_engine::{Fleet, Orchestrator, ProgressRegistry, Supervisor};
use qm_storage::{load_records, CatalogCache, Paths, PidFile, RecordsError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("another qmd instance is running (pid {0})")]
    AlreadyRunning(u32),
    #[error("lock file: {0}")]
    Lock(std::io::Error),
    #[error("fleet records: {0}")]
    Records(#[from] RecordsError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything a running daemon owns.
pub struct Daemon {
    pub orchestrator: Arc<Orchestrator<DaemonNotify, SystemClock>>,
    pub fleet: Arc<Fleet<DaemonNotify, SystemClock>>,
    lock_path: std::path::PathBuf,
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.lock_path);
    }
}

/// Build and start the daemon.
pub async fn startup(config: &Config) -> Result<Daemon, LifecycleError> {
    let paths = config.paths();
    acquire_lock(&paths).await?;

    let clock = SystemClock;
    let notify = DaemonNotify::from_config(config.desktop_notifications);
    let registry = Arc::new(ProgressRegistry::new(clock.utc()));
    let sidecar = SidecarClient::new();
    let pids = PidFile::new(paths.pids_path());

    let records = load_records(&paths.records_path())?;
    tracing::info!(servers = records.len(), root = %paths.root().display(), "fleet loaded");

    let fleet = Arc::new(Fleet::new());
    for record in records {
        fleet.insert(Supervisor::new(
            record,
            paths.clone(),
            Arc::clone(&registry),
            notify.clone(),
            clock.clone(),
            sidecar.clone(),
            pids.clone(),
        ));
    }

    let orchestrator = Orchestrator::new(qm_engine::OrchestratorDeps {
        paths: paths.clone(),
        clock: clock.clone(),
        notify: notify.clone(),
        registry,
        installer: Arc::new(SteamInstaller::new(paths.clone(), config.sources.clone())),
        deployed: Arc::new(DiskProbe::new(paths.clone())),
        latest: Arc::new(HttpLatestProbe::new(config.endpoints.clone())),
        catalog: Arc::new(CatalogCache::new(paths.clone(), clock.clone())),
        fleet: Arc::clone(&fleet),
    });

    reconcile(&fleet, &pids).await;

    if config.deploy_on_start {
        let plan = orchestrator.plan().await;
        if !plan.is_empty() {
            tracing::info!(?plan, "startup deployment");
            if let Err(e) = orchestrator.deploy_plan(plan).await {
                tracing::warn!(error = %e, "startup deployment finished with errors");
            }
        }
    }

    autostart(&fleet).await;

    if let Some(interval) = config.update_interval_secs {
        spawn_update_tick(Arc::clone(&orchestrator), interval);
    }

    Ok(Daemon {
        orchestrator,
        fleet,
        lock_path: paths.lock_path(),
    })
}

/// Single-instance enforcement through a pid lock file.
async fn acquire_lock(paths: &Paths) -> Result<(), LifecycleError> {
    let lock_path = paths.lock_path();
    if let Ok(contents) = std::fs::read_to_string(&lock_path) {
        if let Ok(pid) = contents.trim().parse::<u32>() {
            if pid_alive(pid).await {
                return Err(LifecycleError::AlreadyRunning(pid));
            }
            tracing::info!(pid, "stale lock file from a dead daemon, taking over");
        }
    }
    if let Some(parent) = lock_path.parent() {
        std::fs::create_dir_all(parent).map_err(LifecycleError::Lock)?;
    }
    std::fs::write(&lock_path, std::process::id().to_string()).map_err(LifecycleError::Lock)
}

/// Re-attach servers that kept running across the daemon restart; drop
/// state for the ones that died while we were away.
pub async fn reconcile(fleet: &Arc<Fleet<DaemonNotify, SystemClock>>, pids: &PidFile) {
    let persisted = match pids.load() {
        Ok(persisted) => persisted,
        Err(e) => {
            tracing::warn!(error = %e, "pid state unreadable, skipping reconcile");
            return;
        }
    };
    if persisted.is_empty() {
        return;
    }
    tracing::info!(count = persisted.len(), "reconciling servers from the previous run");

    for (server_id, pid) in persisted {
        let Some(supervisor) = fleet.get(server_id) else {
            tracing::warn!(server = server_id, pid, "pid for an unknown server, clearing");
            let _ = pids.clear(server_id);
            continue;
        };
        if pid_alive(pid).await {
            tracing::info!(server = server_id, pid, "server survived the restart, attaching");
            if let Err(e) = supervisor.attach(pid).await {
                tracing::warn!(server = server_id, pid, error = %e, "attach failed");
            }
        } else {
            tracing::info!(server = server_id, pid, "server died while the daemon was down");
            let _ = pids.clear(server_id);
        }
    }
}

async fn autostart(fleet: &Arc<Fleet<DaemonNotify, SystemClock>>) {
    for supervisor in fleet.all() {
        let wanted = supervisor.record().read().auto_start;
        if !wanted || supervisor.is_running().await {
            continue;
        }
        tracing::info!(server = supervisor.id(), "auto-starting");
        if let Err(e) = supervisor.start().await {
            tracing::warn!(server = supervisor.id(), error = %e, "auto-start failed");
        }
    }
}

/// Periodic plan-and-deploy. Skips a round when a deployment is already
/// in flight.
fn spawn_update_tick(
    orchestrator: Arc<Orchestrator<DaemonNotify, SystemClock>>,
    interval_secs: u64,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await; // immediate first tick is not wanted
        loop {
            ticker.tick().await;
            let plan = orchestrator.plan().await;
            if plan.is_empty() {
                continue;
            }
            tracing::info!(?plan, "scheduled update");
            match orchestrator.deploy_plan(plan).await {
                Ok(()) => {}
                Err(qm_engine::DeployError::AlreadyRunning) => {
                    tracing::info!("scheduled update skipped, deployment in flight");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "scheduled update finished with errors");
                }
            }
        }
    });
}

/// Orchestrate a clean daemon shutdown: leave detached servers running,
/// stop the rest without a countdown so restarts are quick.
pub async fn shutdown(daemon: &Daemon) {
    for supervisor in daemon.fleet.all() {
        let detached = supervisor.record().read().detached;
        if detached {
            tracing::info!(server = supervisor.id(), "leaving detached server running");
            continue;
        }
        if supervisor.is_running().await {
            supervisor.cancel_stop();
            let record = supervisor.record();
            let delay = {
                let mut rec = record.write();
                std::mem::replace(&mut rec.shutdown_delay_secs, 0)
            };
            if let Err(e) = supervisor.stop().await {
                tracing::warn!(server = supervisor.id(), error = %e, "shutdown stop failed");
            }
            record.write().shutdown_delay_secs = delay;
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
