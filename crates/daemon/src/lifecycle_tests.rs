// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg(unix)]

use super::*;
use qm_core::{Channel, ServerRecord, SupervisorStatus};
use qm_storage::save_records;

fn config(dir: &tempfile::TempDir) -> Config {
    Config::load_from(dir.path().to_path_buf()).unwrap()
}

#[tokio::test]
async fn startup_with_empty_root() {
    let dir = tempfile::tempdir().unwrap();
    let daemon = startup(&config(&dir)).await.unwrap();
    assert!(daemon.fleet.is_empty());
    assert!(!daemon.orchestrator.progress_snapshot().updating);
}

#[tokio::test]
async fn startup_builds_one_supervisor_per_record() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir);
    let paths = cfg.paths();
    save_records(
        &paths.records_path(),
        &[
            ServerRecord::new(1, "alpha", 27500, Channel::Release),
            ServerRecord::new(2, "beta", 27510, Channel::Beta),
        ],
    )
    .unwrap();

    let daemon = startup(&cfg).await.unwrap();
    assert_eq!(daemon.fleet.len(), 2);
    assert_eq!(daemon.fleet.get(2).unwrap().record().read().channel, Channel::Beta);
}

#[tokio::test]
async fn second_instance_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir);
    let daemon = startup(&cfg).await.unwrap();

    let err = startup(&cfg).await.unwrap_err();
    assert!(matches!(err, LifecycleError::AlreadyRunning(pid) if pid == std::process::id()));
    drop(daemon);
}

#[tokio::test]
async fn dropping_the_daemon_releases_the_lock() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir);
    let daemon = startup(&cfg).await.unwrap();
    drop(daemon);
    assert!(startup(&cfg).await.is_ok());
}

#[tokio::test]
async fn stale_lock_is_taken_over() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir);
    let paths = cfg.paths();
    std::fs::create_dir_all(paths.state_dir()).unwrap();
    // A pid far beyond any real process.
    std::fs::write(paths.lock_path(), "3999999").unwrap();

    assert!(startup(&cfg).await.is_ok());
}

#[tokio::test]
async fn reconcile_attaches_live_and_clears_dead() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir);
    let paths = cfg.paths();
    save_records(
        &paths.records_path(),
        &[
            ServerRecord::new(1, "alpha", 27500, Channel::Release),
            ServerRecord::new(2, "beta", 27510, Channel::Release),
        ],
    )
    .unwrap();

    // Server 1 "survived" as a live process; server 2's pid is gone.
    let mut survivor = tokio::process::Command::new("sleep").arg("30").spawn().unwrap();
    let live_pid = survivor.id().unwrap();
    let pids = PidFile::new(paths.pids_path());
    pids.set(1, live_pid).unwrap();
    pids.set(2, 3_999_999).unwrap();

    let daemon = startup(&cfg).await.unwrap();

    let alpha = daemon.fleet.get(1).unwrap();
    assert_eq!(alpha.state().status(), SupervisorStatus::Running);
    assert!(alpha.is_running().await);

    let beta = daemon.fleet.get(2).unwrap();
    assert_eq!(beta.state().status(), SupervisorStatus::Idle);

    let remaining = pids.load().unwrap();
    assert_eq!(remaining, vec![(1, live_pid)], "dead pid cleared, live one kept");

    survivor.kill().await.unwrap();
}

#[tokio::test]
async fn pid_for_unknown_server_is_cleared() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir);
    let paths = cfg.paths();
    let pids = PidFile::new(paths.pids_path());
    pids.set(42, std::process::id()).unwrap();

    let _daemon = startup(&cfg).await.unwrap();
    assert!(pids.load().unwrap().is_empty());
}
