// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use qm_core::Channel;
use std::fs;

fn probe(dir: &tempfile::TempDir) -> (DiskProbe, Paths) {
    let paths = Paths::new(dir.path());
    (DiskProbe::new(paths.clone()), paths)
}

#[tokio::test]
async fn missing_artifacts_probe_missing() {
    let dir = tempfile::tempdir().unwrap();
    let (probe, _paths) = probe(&dir);
    for component in [
        Component::SteamCmd,
        Component::Release,
        Component::Beta,
        Component::BepInEx,
        Component::LaunchPad,
        Component::CommandRelay,
    ] {
        assert_eq!(probe.deployed(component).await, VersionInfo::Missing, "{component}");
    }
}

#[tokio::test]
async fn channel_build_id_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let (probe, paths) = probe(&dir);
    fs::create_dir_all(paths.channel_dir(Channel::Release)).unwrap();
    fs::write(paths.channel_build_id_path(Channel::Release), "1001\n").unwrap();

    assert_eq!(
        probe.deployed(Component::Release).await,
        VersionInfo::Version("1001".into())
    );
}

#[tokio::test]
async fn channel_without_marker_is_unknown() {
    let dir = tempfile::tempdir().unwrap();
    let (probe, paths) = probe(&dir);
    fs::create_dir_all(paths.channel_dir(Channel::Beta)).unwrap();
    assert_eq!(probe.deployed(Component::Beta).await, VersionInfo::Unknown);
}

#[tokio::test]
async fn empty_marker_is_unknown() {
    let dir = tempfile::tempdir().unwrap();
    let (probe, paths) = probe(&dir);
    fs::create_dir_all(paths.channel_dir(Channel::Beta)).unwrap();
    fs::write(paths.channel_build_id_path(Channel::Beta), "  \n").unwrap();
    assert_eq!(probe.deployed(Component::Beta).await, VersionInfo::Unknown);
}

#[tokio::test]
async fn framework_version_marker() {
    let dir = tempfile::tempdir().unwrap();
    let (probe, paths) = probe(&dir);
    fs::create_dir_all(paths.bepinex_dir()).unwrap();
    fs::write(paths.bepinex_dir().join("version.txt"), "5.4.21.0").unwrap();
    assert_eq!(
        probe.deployed(Component::BepInEx).await,
        VersionInfo::Version("5.4.21.0".into())
    );
}

#[tokio::test]
async fn loader_manifest_version() {
    let dir = tempfile::tempdir().unwrap();
    let (probe, paths) = probe(&dir);
    fs::create_dir_all(paths.launchpad_dir()).unwrap();
    fs::write(
        paths.launchpad_dir().join("manifest.json"),
        r#"{"name":"LaunchPad","version":"1.2.3"}"#,
    )
    .unwrap();
    assert_eq!(
        probe.deployed(Component::LaunchPad).await,
        VersionInfo::Version("1.2.3".into())
    );
}

#[tokio::test]
async fn loader_bad_manifest_is_unknown() {
    let dir = tempfile::tempdir().unwrap();
    let (probe, paths) = probe(&dir);
    fs::create_dir_all(paths.launchpad_dir()).unwrap();
    fs::write(paths.launchpad_dir().join("manifest.json"), "{oops").unwrap();
    assert_eq!(probe.deployed(Component::LaunchPad).await, VersionInfo::Unknown);
}

#[cfg(unix)]
#[tokio::test]
async fn present_steamcmd_is_unknown_version() {
    let dir = tempfile::tempdir().unwrap();
    let (probe, paths) = probe(&dir);
    fs::create_dir_all(paths.steamcmd_dir()).unwrap();
    fs::write(paths.steamcmd_dir().join("steamcmd.sh"), "#!/bin/sh\n").unwrap();
    assert_eq!(probe.deployed(Component::SteamCmd).await, VersionInfo::Unknown);
}
