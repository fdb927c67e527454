// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transient per-server state.
//!
//! Everything in here is rebuilt from the log on each run. Mutations come
//! from exactly two places: the single tailer task (log-driven) and the
//! caller of a supervisor method, so per-field mutexes are enough.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use qm_core::{ChatRing, ClientSession, SupervisorStatus};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Minimum interval between queued player saves for one steam id.
pub const PLAYER_SAVE_INTERVAL: Duration = Duration::from_secs(10);

/// Last recorded failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastError {
    pub message: String,
    pub at: DateTime<Utc>,
}

/// An entry observed inside a CLIENTS response block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedClient {
    pub name: String,
    pub steam_id: String,
}

/// Queued player saves with per-id dedup.
#[derive(Debug, Default)]
pub struct PendingSaves {
    queue: VecDeque<String>,
    last_by_id: HashMap<String, Instant>,
}

impl PendingSaves {
    /// Queue a save for a steam id unless one was queued within the
    /// dedup interval. Returns whether it was accepted.
    pub fn try_queue(&mut self, steam_id: &str, save_name: String, now: Instant) -> bool {
        if let Some(last) = self.last_by_id.get(steam_id) {
            if now.duration_since(*last) < PLAYER_SAVE_INTERVAL {
                return false;
            }
        }
        self.last_by_id.insert(steam_id.to_string(), now);
        self.queue.push_back(save_name);
        true
    }

    pub fn pop_oldest(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.last_by_id.clear();
    }
}

/// Shared transient state of one server.
pub struct ServerState {
    status: Mutex<SupervisorStatus>,
    pub last_error: Mutex<Option<LastError>>,
    pub started_at: Mutex<Option<DateTime<Utc>>>,
    pub exited_at: Mutex<Option<DateTime<Utc>>>,
    pub saved_at: Mutex<Option<DateTime<Utc>>>,
    pub sessions: Mutex<Vec<ClientSession>>,
    pub chat: Mutex<ChatRing>,
    pub world_id: Mutex<String>,
    pub world_name: Mutex<String>,
    pub difficulty: Mutex<String>,
    pub last_player: Mutex<String>,
    pub storming: AtomicBool,
    /// Set by the fatal-error matcher; decides Failed vs Idle at exit.
    pub fatal: AtomicBool,
    pub pending_saves: Mutex<PendingSaves>,
    /// Open CLIENTS response block, if one is being parsed.
    pub clients_block: Mutex<Option<Vec<ObservedClient>>>,
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            status: Mutex::new(SupervisorStatus::Idle),
            last_error: Mutex::new(None),
            started_at: Mutex::new(None),
            exited_at: Mutex::new(None),
            saved_at: Mutex::new(None),
            sessions: Mutex::new(Vec::new()),
            chat: Mutex::new(ChatRing::default()),
            world_id: Mutex::new(String::new()),
            world_name: Mutex::new(String::new()),
            difficulty: Mutex::new(String::new()),
            last_player: Mutex::new(String::new()),
            storming: AtomicBool::new(false),
            fatal: AtomicBool::new(false),
            pending_saves: Mutex::new(PendingSaves::default()),
            clients_block: Mutex::new(None),
        }
    }

    pub fn status(&self) -> SupervisorStatus {
        *self.status.lock()
    }

    pub fn set_status(&self, status: SupervisorStatus) {
        let mut guard = self.status.lock();
        if *guard != status {
            tracing::debug!(from = %*guard, to = %status, "server state transition");
            *guard = status;
        }
    }

    pub fn set_error(&self, message: impl Into<String>, at: DateTime<Utc>) {
        *self.last_error.lock() = Some(LastError {
            message: message.into(),
            at,
        });
    }

    pub fn storming(&self) -> bool {
        self.storming.load(Ordering::Relaxed)
    }

    pub fn set_storming(&self, on: bool) {
        self.storming.store(on, Ordering::Relaxed);
    }

    /// Reset for a fresh run: previous run's sessions, chat, and flags
    /// are gone; the roster file keeps the history.
    pub fn reset_for_start(&self, at: DateTime<Utc>) {
        self.set_status(SupervisorStatus::Starting);
        *self.last_error.lock() = None;
        *self.started_at.lock() = Some(at);
        *self.exited_at.lock() = None;
        self.sessions.lock().clear();
        self.chat.lock().clear();
        self.storming.store(false, Ordering::Relaxed);
        self.fatal.store(false, Ordering::Relaxed);
        self.pending_saves.lock().clear();
        *self.clients_block.lock() = None;
    }
}

#[cfg(test)]
#[path = "server_state_tests.rs"]
mod tests;
