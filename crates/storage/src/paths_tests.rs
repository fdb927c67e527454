// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn paths() -> Paths {
    Paths::new("/srv/qm")
}

#[test]
fn shared_tree_layout() {
    let p = paths();
    assert_eq!(p.steamcmd_dir(), PathBuf::from("/srv/qm/shared/steamcmd"));
    assert_eq!(
        p.channel_dir(Channel::Release),
        PathBuf::from("/srv/qm/shared/channels/release")
    );
    assert_eq!(
        p.channel_dir(Channel::Beta),
        PathBuf::from("/srv/qm/shared/channels/beta")
    );
    assert_eq!(p.bepinex_dir(), PathBuf::from("/srv/qm/shared/bepinex"));
}

#[test]
fn per_server_tree_layout() {
    let p = paths();
    assert_eq!(p.game_dir(3), PathBuf::from("/srv/qm/servers/3/game"));
    assert_eq!(p.server_log_path(3), PathBuf::from("/srv/qm/servers/3/logs/output.log"));
    assert_eq!(p.roster_path(3), PathBuf::from("/srv/qm/servers/3/logs/players.log"));
    assert_eq!(p.blacklist_path(3), PathBuf::from("/srv/qm/servers/3/blacklist.txt"));
}

#[test]
fn plugin_overlay_targets() {
    let p = paths();
    assert_eq!(
        p.server_loader_dir(1),
        PathBuf::from("/srv/qm/servers/1/game/BepInEx/plugins/LaunchPad")
    );
    assert_eq!(
        p.server_framework_log_path(1),
        PathBuf::from("/srv/qm/servers/1/game/BepInEx/LogOutput.log")
    );
}

#[test]
fn distinct_servers_do_not_collide() {
    let p = paths();
    assert_ne!(p.server_root(1), p.server_root(2));
}

#[test]
fn daemon_state_layout() {
    let p = paths();
    assert_eq!(p.pids_path(), PathBuf::from("/srv/qm/state/pids.json"));
    assert_eq!(p.records_path(), PathBuf::from("/srv/qm/fleet.toml"));
}
