// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Version probe deadline (default: 10s).
pub fn probe_timeout() -> Duration {
    parse_duration_ms("QM_PROBE_TIMEOUT_MS").unwrap_or(Duration::from_secs(10))
}

/// Latest-version HTTP client timeout (default: 10s).
pub fn http_timeout() -> Duration {
    parse_duration_ms("QM_HTTP_TIMEOUT_MS").unwrap_or(Duration::from_secs(10))
}

/// Sidecar command POST timeout (default: 10s).
pub fn sidecar_timeout() -> Duration {
    parse_duration_ms("QM_SIDECAR_TIMEOUT_MS").unwrap_or(Duration::from_secs(10))
}

/// Component install ceiling, a safety net over channel downloads
/// (default: 30 minutes).
pub fn install_timeout() -> Duration {
    parse_duration_ms("QM_INSTALL_TIMEOUT_MS").unwrap_or(Duration::from_secs(30 * 60))
}
