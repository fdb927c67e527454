// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Latest-version probe over HTTP.
//!
//! Channels publish a bare build id; the plugins publish release tags as
//! JSON (`tag_name`). A failed fetch falls back to the last good answer
//! for that component, and only reports `Unknown` when there has never
//! been one — remote flakiness must not flap the planner.

use super::LatestProbe;
use async_trait::async_trait;
use parking_lot::RwLock;
use qm_core::{Component, VersionInfo};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Where to ask for each component's latest version. Components without
/// an endpoint (or with none configured) probe as `Unknown` and are never
/// planned on version grounds.
#[derive(Debug, Clone, Default)]
pub struct LatestEndpoints {
    /// Plain-text build id of the release channel.
    pub release: Option<String>,
    /// Plain-text build id of the beta channel.
    pub beta: Option<String>,
    /// JSON release feed for the plugin framework.
    pub bepinex: Option<String>,
    /// JSON release feed for the loader.
    pub launchpad: Option<String>,
    /// JSON release feed for the command relay.
    pub relay: Option<String>,
}

impl LatestEndpoints {
    fn url_for(&self, component: Component) -> Option<&str> {
        match component {
            Component::Release => self.release.as_deref(),
            Component::Beta => self.beta.as_deref(),
            Component::BepInEx => self.bepinex.as_deref(),
            Component::LaunchPad => self.launchpad.as_deref(),
            Component::CommandRelay => self.relay.as_deref(),
            Component::SteamCmd | Component::Servers => None,
        }
    }
}

/// HTTP latest-version probe with last-known-good fallback.
#[derive(Clone)]
pub struct HttpLatestProbe {
    http: reqwest::Client,
    endpoints: LatestEndpoints,
    last_good: Arc<RwLock<HashMap<Component, String>>>,
}

impl HttpLatestProbe {
    pub fn new(endpoints: LatestEndpoints) -> Self {
        let http = reqwest::Client::builder()
            .timeout(crate::env::http_timeout())
            .build()
            .unwrap_or_default();
        Self {
            http,
            endpoints,
            last_good: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn fetch(&self, component: Component, url: &str) -> Result<String, String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("status {}", response.status()));
        }
        let body = response.text().await.map_err(|e| e.to_string())?;
        match component {
            Component::Release | Component::Beta => {
                let id = body.trim();
                if id.is_empty() {
                    Err("empty build id".to_string())
                } else {
                    Ok(id.to_string())
                }
            }
            _ => parse_tag(&body).ok_or_else(|| "no tag_name in release feed".to_string()),
        }
    }
}

#[async_trait]
impl LatestProbe for HttpLatestProbe {
    async fn latest(&self, component: Component) -> VersionInfo {
        let Some(url) = self.endpoints.url_for(component) else {
            return VersionInfo::Unknown;
        };
        match self.fetch(component, url).await {
            Ok(version) => {
                self.last_good.write().insert(component, version.clone());
                VersionInfo::Version(version)
            }
            Err(e) => {
                tracing::warn!(component = %component, error = %e, "latest-version fetch failed");
                match self.last_good.read().get(&component) {
                    Some(cached) => VersionInfo::Version(cached.clone()),
                    None => VersionInfo::Unknown,
                }
            }
        }
    }
}

/// Pull `tag_name` out of a release feed: either a single release object
/// or an array with the newest first.
fn parse_tag(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let release = if value.is_array() {
        value.get(0)?.clone()
    } else {
        value
    };
    release
        .get("tag_name")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
