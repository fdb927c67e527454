// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-server supervisor.
//!
//! One supervisor owns the lifecycle of one managed server process:
//! deploy, spawn, tail the log, react to parsed events, run the delayed
//! cancellable shutdown, reap the child, and re-attach processes that
//! outlived a control-plane restart. All lifecycle entry points are
//! serialized per server; state mutated from the log arrives on the
//! single tailer task.

pub mod args;

use crate::command::{send_command, CommandKind};
use crate::dispatcher::{Dispatcher, ServerSignal};
use crate::progress::ProgressRegistry;
use crate::server_state::ServerState;
use crate::tailer;
use parking_lot::{Mutex, RwLock};
use qm_adapters::notify::NotifyAdapter;
use qm_adapters::process::{kill_pid, pid_alive};
use qm_adapters::sidecar::SidecarClient;
use qm_core::{format_elapsed, Clock, ServerRecord, SupervisorStatus};
use qm_storage::{roster, Paths, PidFile};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// How long a polite `QUIT` gets before the hard kill.
const QUIT_GRACE: Duration = Duration::from_secs(3);

/// Callback invoked by `stop_async` when the lifecycle state settles.
pub type StateCallback = Arc<dyn Fn(SupervisorStatus) + Send + Sync>;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("server {0} has no deployed executable")]
    NotConfigured(u32),
    #[error("spawn failed: {0}")]
    ChildSpawnFailed(String),
    #[error("deploy failed: {0}")]
    DeployFailed(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Default)]
struct ProcState {
    pid: Option<u32>,
    attached: bool,
    running: bool,
    /// Closes the tailer and signal tasks for the current run.
    stop_tx: Option<watch::Sender<bool>>,
    /// Cancel channel of the armed shutdown countdown, if any.
    stopping: Option<watch::Sender<bool>>,
    tail_task: Option<JoinHandle<()>>,
}

/// Lifecycle supervisor for one managed server.
pub struct Supervisor<N: NotifyAdapter, C: Clock> {
    id: u32,
    record: Arc<RwLock<ServerRecord>>,
    state: Arc<ServerState>,
    paths: Paths,
    registry: Arc<ProgressRegistry>,
    notify: N,
    clock: C,
    sidecar: SidecarClient,
    pids: PidFile,
    restart_lock: tokio::sync::Mutex<()>,
    proc: Mutex<ProcState>,
    /// Self-handle for the background tasks this supervisor spawns.
    me: Weak<Self>,
}

impl<N: NotifyAdapter, C: Clock> Supervisor<N, C> {
    pub fn new(
        record: ServerRecord,
        paths: Paths,
        registry: Arc<ProgressRegistry>,
        notify: N,
        clock: C,
        sidecar: SidecarClient,
        pids: PidFile,
    ) -> Arc<Self> {
        let id = record.id;
        Arc::new_cyclic(|me| Self {
            id,
            record: Arc::new(RwLock::new(record)),
            state: Arc::new(ServerState::new()),
            paths,
            registry,
            notify,
            clock,
            sidecar,
            pids,
            restart_lock: tokio::sync::Mutex::new(()),
            proc: Mutex::new(ProcState::default()),
            me: me.clone(),
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn record(&self) -> Arc<RwLock<ServerRecord>> {
        Arc::clone(&self.record)
    }

    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    /// Whether the managed process is alive. Attached processes are
    /// checked by pid; spawned children by the reaper's running flag.
    pub async fn is_running(&self) -> bool {
        let (running, attached, pid) = {
            let p = self.proc.lock();
            (p.running, p.attached, p.pid)
        };
        match (attached, pid) {
            (true, Some(pid)) => pid_alive(pid).await,
            _ => running,
        }
    }

    /// Start the server. A running server makes this a no-op.
    pub async fn start(&self) -> Result<(), SupervisorError> {
        if self.is_running().await {
            tracing::info!(server = self.id, "start requested but already running");
            return Ok(());
        }

        if self.record.write().take_pending_save_purge() {
            // Intentionally a log-only consumption: purging saves on a
            // parameter change is destructive and stays manual.
            tracing::info!(
                server = self.id,
                "core start parameters changed since last run; save data left in place"
            );
        }

        let exe = self.paths.server_exe_path(self.id);
        let wants_deploy = self.record.read().auto_update || !exe.exists();
        if wants_deploy {
            if let Err(e) = self.deploy().await {
                tracing::warn!(server = self.id, error = %e, "pre-start deploy failed");
            }
        }
        if !exe.exists() {
            return Err(SupervisorError::NotConfigured(self.id));
        }

        std::fs::create_dir_all(self.paths.save_dir(self.id))?;
        std::fs::create_dir_all(self.paths.log_dir(self.id))?;
        // A stale log would replay last run's lines into the tailer.
        let log_path = self.paths.server_log_path(self.id);
        let _ = std::fs::remove_file(&log_path);

        let (program, arg_vector) = {
            let record = self.record.read();
            (self.launch_program(&exe), args::start_args(&record, &self.paths))
        };

        let mut cmd = tokio::process::Command::new(&program);
        cmd.args(&arg_vector)
            .current_dir(self.paths.game_dir(self.id))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        #[cfg(unix)]
        if self.record.read().detached {
            cmd.process_group(0);
        }

        tracing::info!(server = self.id, program = %program.display(), "starting server");
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let message = e.to_string();
                self.state.set_error(&message, self.clock.utc());
                self.state.set_status(SupervisorStatus::Idle);
                return Err(SupervisorError::ChildSpawnFailed(message));
            }
        };

        let pid = child.id();
        self.state.reset_for_start(self.clock.utc());
        let (stop_tx, stop_rx) = watch::channel(false);
        {
            let mut p = self.proc.lock();
            p.pid = pid;
            p.attached = false;
            p.running = true;
            p.stop_tx = Some(stop_tx);
            p.stopping = None;
        }
        if let Some(pid) = pid {
            if let Err(e) = self.pids.set(self.id, pid) {
                tracing::warn!(server = self.id, error = %e, "pid state write failed");
            }
        }

        self.spawn_tail_and_signals(log_path, stop_rx);

        let Some(this) = self.me.upgrade() else {
            return Ok(());
        };
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => tracing::info!(server = this.id, %status, "server exited"),
                Err(e) => tracing::warn!(server = this.id, error = %e, "wait failed"),
            }
            this.on_child_exit().await;
        });

        self.announce("Server starting").await;
        Ok(())
    }

    /// Re-attach a server process that outlived a control-plane restart.
    pub async fn attach(&self, pid: u32) -> Result<(), SupervisorError> {
        tracing::info!(server = self.id, pid, "attaching to running server");
        let (stop_tx, stop_rx) = watch::channel(false);
        {
            let mut p = self.proc.lock();
            p.pid = Some(pid);
            p.attached = true;
            p.running = true;
            p.stop_tx = Some(stop_tx);
            p.stopping = None;
        }
        self.state.set_status(SupervisorStatus::Running);
        if let Err(e) = self.pids.set(self.id, pid) {
            tracing::warn!(server = self.id, error = %e, "pid state write failed");
        }

        self.spawn_tail_and_signals(self.paths.server_log_path(self.id), stop_rx);

        // No child handle to wait on: poll liveness instead.
        let Some(this) = self.me.upgrade() else {
            return Ok(());
        };
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(1)).await;
                if !pid_alive(pid).await {
                    break;
                }
            }
            tracing::info!(server = this.id, pid, "attached server exited");
            this.on_child_exit().await;
        });
        Ok(())
    }

    /// Stop with the record's shutdown delay, blocking until the process
    /// is gone and the roster is closed out. Not running is a no-op; an
    /// already armed countdown is left to run.
    pub async fn stop(&self) -> Result<(), SupervisorError> {
        if !self.is_running().await {
            return Ok(());
        }
        let Some(cancel_rx) = self.arm_stopping() else {
            tracing::info!(server = self.id, "stop requested but a countdown is already armed");
            return Ok(());
        };
        let delay = self.record.read().shutdown_delay_secs;
        self.state.set_status(SupervisorStatus::Stopping);

        if self.countdown(delay, cancel_rx).await {
            self.shutdown_child().await;
        } else {
            self.state.set_status(SupervisorStatus::Running);
        }
        Ok(())
    }

    /// Schedule the stop countdown without blocking the caller.
    /// Idempotent while a countdown is armed.
    pub fn stop_async(&self, on_change: Option<StateCallback>) {
        if self.proc.lock().stopping.is_some() {
            return;
        }
        let Some(this) = self.me.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(e) = this.stop().await {
                tracing::warn!(server = this.id, error = %e, "scheduled stop failed");
            }
            if let Some(callback) = on_change {
                callback(this.state.status());
            }
        });
    }

    /// Cancel an armed shutdown countdown. Idempotent; after the
    /// countdown reached zero this is a no-op.
    pub fn cancel_stop(&self) {
        let sender = self.proc.lock().stopping.take();
        if let Some(tx) = sender {
            tracing::info!(server = self.id, "shutdown countdown canceled");
            let _ = tx.send(true);
        }
    }

    /// Stop, wait the configured restart delay, start. Concurrent
    /// restarts serialize on the per-server restart lock.
    pub async fn restart(&self) -> Result<(), SupervisorError> {
        let _guard = self.restart_lock.lock().await;
        self.stop().await?;
        let delay = self.record.read().restart_delay_secs;
        if delay > 0 {
            tokio::time::sleep(Duration::from_secs(delay)).await;
        }
        self.start().await
    }

    /// Mirror the shared artifacts into this server's game dir: channel
    /// root, framework overlay, loader and relay under the plugins dir.
    pub async fn deploy(&self) -> Result<(), SupervisorError> {
        let channel = self.record.read().channel;
        let game_dir = self.paths.game_dir(self.id);
        let pairs: Vec<(PathBuf, PathBuf)> = [
            (self.paths.channel_dir(channel), game_dir.clone()),
            (self.paths.bepinex_dir(), game_dir.clone()),
            (self.paths.launchpad_dir(), self.paths.server_loader_dir(self.id)),
            (self.paths.relay_dir(), self.paths.server_plugins_dir(self.id)),
        ]
        .into_iter()
        .filter(|(src, _)| src.exists())
        .collect();

        if self.state.status().is_active() {
            // Deliberately not prevented: overwriting a live server's
            // files is OS-defined behavior.
            tracing::warn!(server = self.id, "mirroring into a running server's game dir");
        }

        let roots: Vec<PathBuf> = pairs.iter().map(|(src, _)| src.clone()).collect();
        let total = tokio::task::spawn_blocking(move || {
            let refs: Vec<&std::path::Path> = roots.iter().map(PathBuf::as_path).collect();
            qm_mirror::count_files(&refs)
        })
        .await
        .ok()
        .and_then(Result::ok)
        .unwrap_or(0);

        let now = self.clock.utc();
        self.registry.server_begin(self.id, "Copying", now);
        self.registry.server_update(self.id, "Copying", 0, total, now);

        let processed = Arc::new(AtomicU64::new(0));
        let mut errors: Vec<String> = Vec::new();
        for (src, dst) in pairs {
            let registry = Arc::clone(&self.registry);
            let processed = Arc::clone(&processed);
            let clock = self.clock.clone();
            let id = self.id;
            let result = tokio::task::spawn_blocking(move || {
                qm_mirror::mirror(&src, &dst, &mut |_, _| {
                    let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                    registry.server_update(id, "Copying", done, total, clock.utc());
                })
            })
            .await;
            match result {
                Ok(Ok(stats)) => {
                    tracing::debug!(server = id, copied = stats.copied, skipped = stats.skipped, "mirror pass done");
                }
                Ok(Err(e)) => errors.push(e.to_string()),
                Err(e) => errors.push(format!("mirror task failed: {e}")),
            }
        }

        #[cfg(windows)]
        self.bootstrap_framework().await;

        let now = self.clock.utc();
        if errors.is_empty() {
            self.registry.server_complete(self.id, "Completed", None, now);
            Ok(())
        } else {
            let joined = errors.join("; ");
            self.registry.server_complete(self.id, "Failed", Some(&joined), now);
            Err(SupervisorError::DeployFailed(joined))
        }
    }

    /// Send one command to the server's sidecar. Best-effort: failures
    /// are returned for the caller to log, never lifecycle-relevant.
    pub async fn send_command(
        &self,
        kind: CommandKind,
        payload: &str,
    ) -> Result<(), qm_adapters::sidecar::SidecarError> {
        let player = self.state.last_player.lock().clone();
        send_command(
            &self.record,
            &self.state,
            &self.paths,
            &self.sidecar,
            &self.clock,
            kind,
            payload,
            &player,
        )
        .await
    }

    // --- internals ---

    /// Pick the program to exec: with the plugin framework overlaid on
    /// POSIX, the wrapper script beside the executable (made executable
    /// if needed); otherwise the executable itself.
    #[cfg(unix)]
    fn launch_program(&self, exe: &std::path::Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        if !self.paths.server_framework_dir(self.id).exists() {
            return exe.to_path_buf();
        }
        let wrapper = self.paths.framework_wrapper_path(self.id);
        if !wrapper.exists() {
            tracing::warn!(
                server = self.id,
                "plugin framework present but wrapper script missing; starting executable directly"
            );
            return exe.to_path_buf();
        }
        if let Ok(meta) = std::fs::metadata(&wrapper) {
            if meta.permissions().mode() & 0o111 == 0 {
                let _ = std::fs::set_permissions(&wrapper, std::fs::Permissions::from_mode(0o755));
            }
        }
        wrapper
    }

    #[cfg(not(unix))]
    fn launch_program(&self, exe: &std::path::Path) -> PathBuf {
        exe.to_path_buf()
    }

    /// One-shot bootstrap so the plugin framework creates its config
    /// tree. Non-fatal on every path.
    #[cfg(windows)]
    async fn bootstrap_framework(&self) {
        use qm_adapters::subprocess::{run_with_timeout, BOOTSTRAP_TIMEOUT};

        let exe = self.paths.server_exe_path(self.id);
        if !exe.exists() || !self.paths.server_framework_dir(self.id).exists() {
            return;
        }
        let mut cmd = tokio::process::Command::new(&exe);
        cmd.args(["-batchmode", "-nographics", "-quit"])
            .current_dir(self.paths.game_dir(self.id));
        if let Err(e) = run_with_timeout(cmd, BOOTSTRAP_TIMEOUT, "framework bootstrap").await {
            tracing::warn!(server = self.id, error = %e, "framework bootstrap run failed");
        }
        if !self.paths.server_framework_config_dir(self.id).exists() {
            tracing::warn!(server = self.id, "framework config tree missing after bootstrap");
        }
    }

    fn spawn_tail_and_signals(&self, log_path: PathBuf, stop_rx: watch::Receiver<bool>) {
        let (signal_tx, mut signal_rx) = mpsc::channel(8);
        let dispatcher = Dispatcher::new(
            Arc::clone(&self.record),
            Arc::clone(&self.state),
            self.paths.clone(),
            self.sidecar.clone(),
            self.clock.clone(),
            signal_tx,
        );

        let (mut lines, _tail) = tailer::spawn(log_path, stop_rx);
        let pump = tokio::spawn(async move {
            while let Some(line) = lines.recv().await {
                dispatcher.dispatch(&line).await;
            }
        });
        self.proc.lock().tail_task = Some(pump);

        let Some(this) = self.me.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            while let Some(signal) = signal_rx.recv().await {
                match signal {
                    ServerSignal::Fatal { message } => {
                        tracing::error!(server = this.id, %message, "fatal server error; stopping");
                        this.state.set_status(SupervisorStatus::Stopping);
                        this.shutdown_child().await;
                    }
                }
            }
        });
    }

    /// Countdown with a 1-second tick, cancellable at any point before
    /// zero. Returns whether it ran to completion.
    async fn countdown(&self, delay: u64, mut cancel_rx: watch::Receiver<bool>) -> bool {
        if delay > 0 {
            self.chat_line(&format!("Server shutting down in {}", format_elapsed(delay)))
                .await;
            let mut remaining = delay;
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {
                        remaining -= 1;
                        if remaining == 10 {
                            self.chat_line("Server shutting down in 10 seconds").await;
                        }
                        if remaining == 0 {
                            break;
                        }
                    }
                    changed = cancel_rx.changed() => {
                        if changed.is_err() || *cancel_rx.borrow() {
                            self.chat_line("Shutdown canceled").await;
                            self.proc.lock().stopping = None;
                            return false;
                        }
                    }
                }
            }
        }
        self.chat_line("Server shutting down now").await;
        self.proc.lock().stopping = None;
        true
    }

    /// `QUIT` through the sidecar, a bounded grace wait, then hard kill.
    async fn shutdown_child(&self) {
        let _ = self.send_command(CommandKind::Console, "QUIT").await;

        let deadline = tokio::time::Instant::now() + QUIT_GRACE;
        while tokio::time::Instant::now() < deadline {
            if !self.proc.lock().running {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let pid = self.proc.lock().pid;
        if let Some(pid) = pid {
            tracing::warn!(server = self.id, pid, "grace period elapsed, killing");
            if let Err(e) = kill_pid(pid, true).await {
                tracing::warn!(server = self.id, pid, error = %e, "kill failed");
            }
        }
        // Wait for the reaper to finish the close-out.
        let drain_deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        while tokio::time::Instant::now() < drain_deadline {
            if !self.proc.lock().running {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// The always-run exit path: drain the tailer, close out sessions,
    /// rewrite the roster, reset the chat ring, settle the final state.
    async fn on_child_exit(&self) {
        let (stop_tx, tail_task) = {
            let mut p = self.proc.lock();
            p.stopping = None;
            (p.stop_tx.take(), p.tail_task.take())
        };
        if let Some(tx) = stop_tx {
            let _ = tx.send(true);
        }
        if let Some(task) = tail_task {
            let _ = task.await;
        }

        let now = self.clock.utc();
        *self.state.exited_at.lock() = Some(now);
        {
            let mut sessions = self.state.sessions.lock();
            for session in sessions.iter_mut().filter(|s| s.is_online()) {
                session.disconnected = Some(now);
            }
        }
        let sessions = self.state.sessions.lock().clone();
        if let Err(e) = roster::write_roster(&self.paths.roster_path(self.id), &sessions) {
            tracing::warn!(server = self.id, error = %e, "roster close-out failed");
        }
        self.state.chat.lock().clear();

        if let Err(e) = self.pids.clear(self.id) {
            tracing::warn!(server = self.id, error = %e, "pid state clear failed");
        }

        let fatal = self.state.fatal.load(Ordering::Relaxed);
        self.state.set_status(if fatal {
            SupervisorStatus::Failed
        } else {
            SupervisorStatus::Idle
        });

        {
            let mut p = self.proc.lock();
            p.running = false;
            p.pid = None;
            p.attached = false;
        }
        self.announce("Server stopped").await;
    }

    /// Arm the countdown cancel channel; `None` when one is already armed.
    fn arm_stopping(&self) -> Option<watch::Receiver<bool>> {
        let mut p = self.proc.lock();
        if p.stopping.is_some() {
            return None;
        }
        let (tx, rx) = watch::channel(false);
        p.stopping = Some(tx);
        Some(rx)
    }

    async fn chat_line(&self, text: &str) {
        if self.send_command(CommandKind::Chat, text).await.is_err() {
            tracing::debug!(server = self.id, text, "countdown chat failed");
        }
    }

    /// Best-effort lifecycle notification, gated by the record.
    async fn announce(&self, title: &str) {
        let (enabled, name) = {
            let rec = self.record.read();
            (rec.notify_events, rec.name.clone())
        };
        if enabled {
            let _ = self.notify.notify(title, &name).await;
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
