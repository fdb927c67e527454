// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log-driven event dispatcher.
//!
//! Every line from the tailer runs down an ordered chain of matchers;
//! each matcher whose pattern fires runs its handler, and several may
//! fire for one line. Handlers mutate the server's transient state and
//! produce side effects (roster writes, queued saves, chat). Anything
//! that must change the supervisor's lifecycle (fatal startup errors)
//! goes through the signal channel instead of touching the supervisor
//! directly.

mod patterns;

pub use patterns::{clean_world_token, line_time, save_name};

use crate::command::{send_command, CommandKind};
use crate::server_state::{ObservedClient, ServerState};
use parking_lot::RwLock;
use patterns::patterns;
use qm_adapters::sidecar::SidecarClient;
use qm_core::session::{find_online_mut, upsert_session};
use qm_core::{ChatMessage, ClientSession, Clock, ServerRecord, SupervisorStatus};
use qm_storage::{blacklist, roster, Paths};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Lifecycle requests raised by matchers, consumed by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerSignal {
    /// A fatal startup error was parsed; the server must stop.
    Fatal { message: String },
}

/// Matcher chain over one server's log.
#[derive(Clone)]
pub struct Dispatcher<C: Clock> {
    server_id: u32,
    record: Arc<RwLock<ServerRecord>>,
    state: Arc<ServerState>,
    paths: Paths,
    sidecar: SidecarClient,
    clock: C,
    signals: mpsc::Sender<ServerSignal>,
}

impl<C: Clock> Dispatcher<C> {
    pub fn new(
        record: Arc<RwLock<ServerRecord>>,
        state: Arc<ServerState>,
        paths: Paths,
        sidecar: SidecarClient,
        clock: C,
        signals: mpsc::Sender<ServerSignal>,
    ) -> Self {
        let server_id = record.read().id;
        Self {
            server_id,
            record,
            state,
            paths,
            sidecar,
            clock,
            signals,
        }
    }

    /// Run the line down the chain. Matchers are tried in catalogue
    /// order and all firing handlers run.
    pub async fn dispatch(&self, line: &str) {
        let p = patterns();

        if p.world_saved.is_match(line) {
            self.on_world_saved(line).await;
        }
        if let Some(caps) = p.client_ready.captures(line) {
            self.on_client_ready(&caps[1], &caps[2], line).await;
        }
        if let Some(caps) = p.client_disconnected.captures(line) {
            self.on_client_disconnected(&caps[1], &caps[2], line);
        }
        if let Some(caps) = p.difficulty.captures(line) {
            *self.state.difficulty.lock() = caps[1].to_string();
        }
        if let Some(caps) = p.world_loaded.captures(line) {
            self.on_world_loaded(&caps[1]);
        }
        if let Some(caps) = p.admin.captures(line) {
            self.on_admin(&caps[1]);
        }
        if let Some(caps) = p.chat.captures(line) {
            self.on_chat(&caps[2], &caps[3], line);
        }
        if let Some(caps) = p.pause.captures(line) {
            self.on_pause(&caps[1]);
        }
        if let Some(caps) = p.weather.captures(line) {
            let started = caps[1].eq_ignore_ascii_case("started");
            self.state.set_storming(started);
        }
        if p.server_ready.is_match(line) && self.state.status() == SupervisorStatus::Starting {
            self.state.set_status(SupervisorStatus::Running);
        }
        self.on_clients_block(line);
        if let Some(_caps) = p.invalid_world.captures(line) {
            self.on_invalid_world(line).await;
        }
    }

    async fn on_world_saved(&self, line: &str) {
        let at = line_time(line, self.clock.utc());
        *self.state.saved_at.lock() = Some(at);

        // A completed save lets the oldest queued player save move from
        // the manual tier into the player tier.
        let popped = self.state.pending_saves.lock().pop_oldest();
        if let Some(name) = popped {
            let save_dir = self.paths.save_dir(self.server_id);
            let from = save_dir.join("manualsave").join(&name);
            let to_dir = save_dir.join("playersave");
            let moved = std::fs::create_dir_all(&to_dir)
                .and_then(|_| std::fs::rename(&from, to_dir.join(&name)));
            match moved {
                Ok(()) => tracing::debug!(server = self.server_id, save = %name, "player save promoted"),
                Err(e) => {
                    tracing::warn!(server = self.server_id, save = %name, error = %e, "player save move failed");
                }
            }
        }
    }

    async fn on_client_ready(&self, name: &str, steam_id: &str, line: &str) {
        let at = line_time(line, self.clock.utc());
        let mut appended = None;
        let returning;
        {
            let mut sessions = self.state.sessions.lock();
            returning = sessions.iter().any(|s| s.steam_id == steam_id);
            match find_online_mut(&mut sessions, steam_id, name) {
                Some(existing) => {
                    // Repeat observation of an online client refreshes
                    // identity fields, never duplicates.
                    let mut refresh = existing.clone();
                    refresh.name = name.to_string();
                    refresh.steam_id = steam_id.to_string();
                    existing.merge(&refresh);
                }
                None => {
                    let session = ClientSession::new(steam_id, name, at);
                    appended = Some(session.clone());
                    upsert_session(&mut sessions, session);
                }
            }
            *self.state.last_player.lock() = name.to_string();
        }
        if let Some(session) = appended {
            if let Err(e) = roster::append_session(&self.paths.roster_path(self.server_id), &session) {
                tracing::warn!(server = self.server_id, error = %e, "roster append failed");
            }
        }

        self.maybe_queue_player_save(steam_id, at).await;

        let (template, delay) = {
            let rec = self.record.read();
            let template = if returning {
                rec.welcome_back.clone()
            } else {
                rec.welcome.clone()
            };
            (template, rec.welcome_delay_secs)
        };
        if !template.is_empty() {
            let this = self.clone();
            let player = name.to_string();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(delay)).await;
                this.send_chat(&player, &template).await;
            });
        }
    }

    async fn maybe_queue_player_save(&self, steam_id: &str, at: chrono::DateTime<chrono::Utc>) {
        if !self.record.read().player_saves || steam_id.is_empty() {
            return;
        }
        let excluded = blacklist::load(&self.paths.blacklist_path(self.server_id))
            .unwrap_or_default()
            .iter()
            .any(|id| id == steam_id);
        if excluded {
            return;
        }
        let name = save_name(steam_id, at);
        let accepted = self
            .state
            .pending_saves
            .lock()
            .try_queue(steam_id, name.clone(), self.clock.now());
        if !accepted {
            return;
        }
        let result = send_command(
            &self.record,
            &self.state,
            &self.paths,
            &self.sidecar,
            &self.clock,
            CommandKind::Console,
            &format!("FILE saveas {name}"),
            "",
        )
        .await;
        if result.is_err() {
            tracing::warn!(server = self.server_id, save = %name, "player save command failed");
        }
    }

    fn on_client_disconnected(&self, name: &str, steam_id: &str, line: &str) {
        let at = line_time(line, self.clock.utc());
        let mut changed = false;
        {
            let mut sessions = self.state.sessions.lock();
            if let Some(session) = find_online_mut(&mut sessions, steam_id, name) {
                session.disconnected = Some(at);
                changed = true;
            }
        }
        if changed {
            self.rewrite_roster();
        }
    }

    fn on_world_loaded(&self, raw: &str) {
        let id = clean_world_token(raw);
        if id.is_empty() {
            return;
        }
        *self.state.world_id.lock() = id.clone();
        let mut name = self.state.world_name.lock();
        if name.is_empty() {
            *name = id;
        }
    }

    fn on_admin(&self, steam_id: &str) {
        let mut sessions = self.state.sessions.lock();
        if let Some(session) = sessions
            .iter_mut()
            .rev()
            .find(|s| s.steam_id == steam_id)
        {
            session.admin = true;
        }
    }

    fn on_chat(&self, author: &str, text: &str, line: &str) {
        let accepted = author == "Server" || {
            let sessions = self.state.sessions.lock();
            let lower = author.to_lowercase();
            sessions
                .iter()
                .any(|s| s.is_online() && s.name.to_lowercase() == lower)
        };
        if !accepted {
            return;
        }
        self.state.chat.lock().push(ChatMessage {
            at: line_time(line, self.clock.utc()),
            author: author.to_string(),
            text: text.to_string(),
        });
    }

    fn on_pause(&self, word: &str) {
        let paused = word.eq_ignore_ascii_case("paused");
        match (paused, self.state.status()) {
            (true, SupervisorStatus::Running) => self.state.set_status(SupervisorStatus::Paused),
            (false, SupervisorStatus::Paused) => self.state.set_status(SupervisorStatus::Running),
            _ => {}
        }
    }

    fn on_clients_block(&self, line: &str) {
        let p = patterns();
        if p.clients_header.is_match(line) {
            *self.state.clients_block.lock() = Some(Vec::new());
            return;
        }

        let open = self.state.clients_block.lock().is_some();
        if !open {
            return;
        }

        if p.clients_footer.is_match(line) {
            let observed = self.state.clients_block.lock().take().unwrap_or_default();
            self.reconcile_roster(observed);
            return;
        }
        if let Some(caps) = p.clients_entry.captures(line) {
            if let Some(block) = self.state.clients_block.lock().as_mut() {
                block.push(ObservedClient {
                    name: caps[1].to_string(),
                    steam_id: caps[2].to_string(),
                });
            }
        }
    }

    /// Reconcile the in-memory roster against a CLIENTS response block:
    /// online sessions missing from the block are disconnected; unknown
    /// observed clients are added.
    fn reconcile_roster(&self, observed: Vec<ObservedClient>) {
        let now = self.clock.utc();
        {
            let mut sessions = self.state.sessions.lock();
            for session in sessions.iter_mut().filter(|s| s.is_online()) {
                let seen = observed.iter().any(|o| {
                    (!o.steam_id.is_empty() && o.steam_id == session.steam_id)
                        || o.name.to_lowercase() == session.name.to_lowercase()
                });
                if !seen {
                    session.disconnected = Some(now);
                }
            }
            for client in &observed {
                let known = sessions.iter().any(|s| {
                    s.is_online()
                        && ((!client.steam_id.is_empty() && s.steam_id == client.steam_id)
                            || s.name.to_lowercase() == client.name.to_lowercase())
                });
                if !known {
                    upsert_session(
                        &mut sessions,
                        ClientSession::new(client.steam_id.clone(), client.name.clone(), now),
                    );
                }
            }
        }
        self.rewrite_roster();
    }

    async fn on_invalid_world(&self, line: &str) {
        tracing::error!(server = self.server_id, line, "fatal start parameter");
        self.state.set_error(line, self.clock.utc());
        self.state
            .fatal
            .store(true, std::sync::atomic::Ordering::Relaxed);
        let _ = self
            .signals
            .send(ServerSignal::Fatal {
                message: line.to_string(),
            })
            .await;
    }

    fn rewrite_roster(&self) {
        let sessions = self.state.sessions.lock().clone();
        if let Err(e) = roster::write_roster(&self.paths.roster_path(self.server_id), &sessions) {
            tracing::warn!(server = self.server_id, error = %e, "roster rewrite failed");
        }
    }

    async fn send_chat(&self, player: &str, template: &str) {
        let result = send_command(
            &self.record,
            &self.state,
            &self.paths,
            &self.sidecar,
            &self.clock,
            CommandKind::Chat,
            template,
            player,
        )
        .await;
        if result.is_err() {
            tracing::debug!(server = self.server_id, "chat send failed");
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
