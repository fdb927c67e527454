// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Game-data catalog: scanners plus per-channel TTL caches.
//!
//! World, difficulty, and language metadata is derived from data files
//! under each channel's artifact root. Scans are cheap but not free, so
//! results are cached with a short TTL; the deployment orchestrator
//! invalidates a channel's entries whenever that channel is redeployed.

mod scan;

pub use scan::{scan_difficulties, scan_languages, scan_worlds};

use crate::paths::Paths;
use parking_lot::RwLock;
use qm_core::{Channel, Clock, DifficultyDefinition, LanguageListing, WorldDefinition};
use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default cache TTL.
pub const CATALOG_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("data dir unreadable: {0}")]
    Io(#[from] io::Error),
    #[error("data file malformed: {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

struct Cached<T> {
    value: T,
    cached_at: Instant,
}

/// Per-channel caches over the scanners.
pub struct CatalogCache<C: Clock> {
    paths: Paths,
    clock: C,
    ttl: Duration,
    worlds: RwLock<HashMap<Channel, Cached<Vec<WorldDefinition>>>>,
    difficulties: RwLock<HashMap<Channel, Cached<Vec<DifficultyDefinition>>>>,
    languages: RwLock<HashMap<Channel, Cached<Vec<LanguageListing>>>>,
}

impl<C: Clock> CatalogCache<C> {
    pub fn new(paths: Paths, clock: C) -> Self {
        Self::with_ttl(paths, clock, CATALOG_TTL)
    }

    pub fn with_ttl(paths: Paths, clock: C, ttl: Duration) -> Self {
        Self {
            paths,
            clock,
            ttl,
            worlds: RwLock::new(HashMap::new()),
            difficulties: RwLock::new(HashMap::new()),
            languages: RwLock::new(HashMap::new()),
        }
    }

    /// Worlds for a channel, rescanned on cache miss or TTL expiry.
    pub fn worlds(&self, channel: Channel) -> Result<Vec<WorldDefinition>, CatalogError> {
        if let Some(hit) = self.fresh(&self.worlds, channel) {
            return Ok(hit);
        }
        let scanned = scan_worlds(&self.paths.worlds_dir(channel))?;
        self.store(&self.worlds, channel, scanned.clone());
        Ok(scanned)
    }

    pub fn difficulties(&self, channel: Channel) -> Result<Vec<DifficultyDefinition>, CatalogError> {
        if let Some(hit) = self.fresh(&self.difficulties, channel) {
            return Ok(hit);
        }
        let scanned = scan_difficulties(&self.paths.difficulties_path(channel))?;
        self.store(&self.difficulties, channel, scanned.clone());
        Ok(scanned)
    }

    pub fn languages(&self, channel: Channel) -> Result<Vec<LanguageListing>, CatalogError> {
        if let Some(hit) = self.fresh(&self.languages, channel) {
            return Ok(hit);
        }
        let scanned = scan_languages(&self.paths.languages_dir(channel))?;
        self.store(&self.languages, channel, scanned.clone());
        Ok(scanned)
    }

    /// Drop every cached entry for one channel. Called by the
    /// orchestrator after that channel is redeployed.
    pub fn invalidate_channel(&self, channel: Channel) {
        self.worlds.write().remove(&channel);
        self.difficulties.write().remove(&channel);
        self.languages.write().remove(&channel);
    }

    fn fresh<T: Clone>(
        &self,
        cache: &RwLock<HashMap<Channel, Cached<T>>>,
        channel: Channel,
    ) -> Option<T> {
        let guard = cache.read();
        let entry = guard.get(&channel)?;
        if self.clock.now().duration_since(entry.cached_at) < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    fn store<T>(&self, cache: &RwLock<HashMap<Channel, Cached<T>>>, channel: Channel, value: T) {
        cache.write().insert(
            channel,
            Cached {
                value,
                cached_at: self.clock.now(),
            },
        );
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
