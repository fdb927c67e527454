// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the per-server command sidecar.
//!
//! Each server loads a plugin exposing `POST /command` on localhost;
//! commands are one JSON body per request and a 2xx is the only success
//! signal. The listener port is detected heuristically from the plugin
//! framework's log, falling back to `game port + 1`.

use regex::Regex;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

/// How much of the framework log tail is scanned for a port marker.
const PORT_SCAN_WINDOW: u64 = 128 * 1024;

/// Response bodies are truncated to this many bytes in errors.
const BODY_TRUNCATE: usize = 1024;

#[derive(Debug, Error)]
pub enum SidecarError {
    #[error("sidecar unreachable: {0}")]
    Unreachable(String),
    #[error("sidecar returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Client for the in-process command sidecar.
#[derive(Clone)]
pub struct SidecarClient {
    http: reqwest::Client,
}

impl SidecarClient {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(crate::env::sidecar_timeout())
            .build()
            .unwrap_or_default();
        Self { http }
    }

    /// Send one command line. 2xx is success; anything else carries the
    /// status and a truncated body.
    pub async fn send(&self, port: u16, line: &str) -> Result<(), SidecarError> {
        let url = format!("http://localhost:{port}/command");
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "command": line }))
            .send()
            .await
            .map_err(|e| SidecarError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let mut body = response.text().await.unwrap_or_default();
        body.truncate(BODY_TRUNCATE);
        Err(SidecarError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

impl Default for SidecarClient {
    fn default() -> Self {
        Self::new()
    }
}

// Patterns are literals; a failed compile is a programming error.
#[allow(clippy::unwrap_used)]
fn port_markers() -> &'static [Regex; 3] {
    static MARKERS: OnceLock<[Regex; 3]> = OnceLock::new();
    MARKERS.get_or_init(|| {
        // Preference order, most specific first. The log format is not a
        // contract upstream; these are heuristics.
        [
            Regex::new(r"(?i)command relay listening on (?:port )?(\d{2,5})").unwrap(),
            Regex::new(r"(?i)\[command ?relay\].*?port[ :=]+(\d{2,5})").unwrap(),
            Regex::new(r"(?i)\bcommand port[ :=]+(\d{2,5})\b").unwrap(),
        ]
    })
}

/// Scan the tail of the plugin framework log for the sidecar's listener
/// port. Markers are tried in preference order over the whole window;
/// within one marker the last occurrence wins (restarts append).
pub fn detect_sidecar_port(log_path: &Path) -> Option<u16> {
    let tail = read_tail(log_path, PORT_SCAN_WINDOW)?;
    for marker in port_markers() {
        let mut last = None;
        for caps in marker.captures_iter(&tail) {
            if let Some(port) = caps.get(1).and_then(|m| m.as_str().parse::<u16>().ok()) {
                last = Some(port);
            }
        }
        if last.is_some() {
            return last;
        }
    }
    None
}

fn read_tail(path: &Path, window: u64) -> Option<String> {
    let mut file = File::open(path).ok()?;
    let len = file.metadata().ok()?.len();
    if len > window {
        file.seek(SeekFrom::Start(len - window)).ok()?;
    }
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).ok()?;
    Some(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
#[path = "sidecar_tests.rs"]
mod tests;
