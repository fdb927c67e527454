// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet record persistence.
//!
//! The durable server records live in one TOML file. Loading validates
//! the fleet-wide uniqueness invariants (ids, ports, sidecar ports)
//! before anything else consumes the records.

use qm_core::ServerRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordsError {
    #[error("fleet file unreadable: {0}")]
    Io(#[from] io::Error),
    #[error("fleet file malformed: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("fleet file unwritable: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("duplicate server id {0}")]
    DuplicateId(u32),
    #[error("port {0} used by more than one server (game and sidecar ports share one space)")]
    DuplicatePort(u16),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FleetFile {
    #[serde(default, rename = "server")]
    servers: Vec<ServerRecord>,
}

/// Load and validate every record. A missing file is an empty fleet.
pub fn load_records(path: &Path) -> Result<Vec<ServerRecord>, RecordsError> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let file: FleetFile = toml::from_str(&contents)?;
    validate(&file.servers)?;
    Ok(file.servers)
}

/// Validate and atomically write the fleet file.
pub fn save_records(path: &Path, servers: &[ServerRecord]) -> Result<(), RecordsError> {
    validate(servers)?;
    let file = FleetFile {
        servers: servers.to_vec(),
    };
    let contents = toml::to_string_pretty(&file)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn validate(servers: &[ServerRecord]) -> Result<(), RecordsError> {
    let mut ids = HashSet::new();
    let mut ports = HashSet::new();
    for record in servers {
        if !ids.insert(record.id) {
            return Err(RecordsError::DuplicateId(record.id));
        }
        if !ports.insert(record.port) {
            return Err(RecordsError::DuplicatePort(record.port));
        }
        let sidecar = record.sidecar_port();
        if !ports.insert(sidecar) {
            return Err(RecordsError::DuplicatePort(sidecar));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;
