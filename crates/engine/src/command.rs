// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command dispatch to a server's sidecar.
//!
//! Console commands go through verbatim; chat commands are token-expanded
//! and prefixed with `SAY `. The sidecar port is resolved once per
//! process: override, then cached detection, then the framework-log
//! heuristic, then `port + 1`.

use crate::server_state::ServerState;
use parking_lot::RwLock;
use qm_adapters::sidecar::{detect_sidecar_port, SidecarClient, SidecarError};
use qm_core::session::online_count;
use qm_core::{Clock, ServerRecord, TokenContext};
use qm_storage::Paths;
use std::sync::Arc;

/// What kind of command a payload is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Raw console command line.
    Console,
    /// Chat text; token-expanded and sent as `SAY <text>`.
    Chat,
}

/// Resolve the sidecar port for a record, caching a detected port.
pub fn resolve_sidecar_port(record: &Arc<RwLock<ServerRecord>>, paths: &Paths) -> u16 {
    {
        let rec = record.read();
        if let Some(port) = rec.sidecar_port_override.or(rec.sidecar_port_cached) {
            return port;
        }
    }
    let id = record.read().id;
    if let Some(port) = detect_sidecar_port(&paths.server_framework_log_path(id)) {
        tracing::debug!(server = id, port, "sidecar port detected from framework log");
        record.write().sidecar_port_cached = Some(port);
        return port;
    }
    record.read().sidecar_port()
}

/// Send one command. Failures are returned for logging; callers treat
/// them as best-effort and never change lifecycle state on them.
pub async fn send_command<C: Clock>(
    record: &Arc<RwLock<ServerRecord>>,
    state: &ServerState,
    paths: &Paths,
    sidecar: &SidecarClient,
    clock: &C,
    kind: CommandKind,
    payload: &str,
    player: &str,
) -> Result<(), SidecarError> {
    let line = match kind {
        CommandKind::Console => payload.to_string(),
        CommandKind::Chat => {
            let expanded = {
                let rec = record.read();
                let world_name = state.world_name.lock().clone();
                let last_player = state.last_player.lock().clone();
                let player_count = online_count(&state.sessions.lock());
                TokenContext {
                    record: &rec,
                    world_name: &world_name,
                    player,
                    last_player: &last_player,
                    player_count,
                    now: clock.utc(),
                }
                .expand(payload)
            };
            format!("SAY {expanded}")
        }
    };

    let port = resolve_sidecar_port(record, paths);
    let result = sidecar.send(port, &line).await;
    if let Err(e) = &result {
        tracing::warn!(server = record.read().id, port, error = %e, "sidecar command failed");
    }
    result
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
