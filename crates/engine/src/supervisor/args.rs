// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Start argument vector.
//!
//! The child's argument order is part of the contract with the game
//! binary: a fixed positional prefix, the log and settings paths, then
//! a `-SETTINGS` tail enumerating every configured field in a fixed
//! order. Booleans are `true`/`false`; everything else is stringified.

use qm_core::ServerRecord;
use qm_storage::Paths;

fn flag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Build the full argument vector for one server start.
pub fn start_args(record: &ServerRecord, paths: &Paths) -> Vec<String> {
    let id = record.id;
    let mut args: Vec<String> = vec![
        "-FILE".into(),
        "start".into(),
        record.name.clone(),
        record.start.world_id.clone(),
        record.start.difficulty.clone(),
        record.start.start_condition.clone(),
        record.start.start_location.clone(),
        "-logFile".into(),
        paths.server_log_path(id).display().to_string(),
        "-SETTINGSPATH".into(),
        paths.settings_path(id).display().to_string(),
        "-SETTINGS".into(),
    ];

    let settings: Vec<(&str, String)> = vec![
        ("ServerVisible", flag(record.visible).into()),
        ("GamePort", record.port.to_string()),
        ("ServerName", record.name.clone()),
        ("ServerPassword", record.password.clone()),
        ("ServerAuthSecret", record.auth_secret.clone()),
        ("ServerMaxPlayers", record.max_players.to_string()),
        ("AutoSave", flag(record.auto_save).into()),
        ("SaveInterval", record.save_interval_secs.to_string()),
        ("SavePath", paths.save_dir(id).display().to_string()),
        ("AutoPauseServer", flag(record.auto_pause).into()),
        ("StartLocalHost", "true".into()),
        ("LocalIpAddress", "0.0.0.0".into()),
        ("MaxAutoSaves", record.max_autosaves.max(1).to_string()),
        ("MaxQuickSaves", record.max_quicksaves.max(1).to_string()),
        ("DeleteSkeletonOnDecay", flag(record.delete_skeleton_on_decay).into()),
        ("UseSteamP2P", flag(record.steam_p2p).into()),
        ("DisconnectTimeout", effective_disconnect_timeout(record).to_string()),
    ];
    for (key, value) in settings {
        args.push(key.into());
        args.push(value);
    }
    args
}

fn effective_disconnect_timeout(record: &ServerRecord) -> u32 {
    if record.disconnect_timeout_ms == 0 {
        10_000
    } else {
        record.disconnect_timeout_ms
    }
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
