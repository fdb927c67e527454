// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Quartermaster Daemon (qmd)
//!
//! Long-running control plane for a fleet of dedicated game servers:
//! keeps the shared artifacts current, supervises every server process,
//! and recovers attached servers across its own restarts.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use qm_daemon::{lifecycle, Config, LifecycleError};
use tracing::info;

/// Rotate the daemon's own log when it grows past this.
const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("qmd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("qmd {}", env!("CARGO_PKG_VERSION"));
                println!("Quartermaster Daemon - dedicated game-server control plane");
                println!();
                println!("USAGE:");
                println!("    qmd");
                println!();
                println!("The root directory is taken from QM_ROOT; configuration is");
                println!("read from <root>/qmd.toml and the fleet from <root>/fleet.toml.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: qmd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    rotate_log_if_needed(&config);
    let _log_guard = setup_logging(&config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(config))
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!(root = %config.root.display(), "starting qmd");

    let daemon = match lifecycle::startup(&config).await {
        Ok(daemon) => daemon,
        Err(LifecycleError::AlreadyRunning(pid)) => {
            eprintln!("qmd is already running");
            eprintln!("  pid: {pid}");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    info!(servers = daemon.fleet.len(), "qmd up");
    wait_for_shutdown_signal().await;

    info!("shutdown signal received");
    lifecycle::shutdown(&daemon).await;
    info!("qmd stopped");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            tracing::warn!(error = %e, "SIGTERM handler failed, relying on ctrl-c");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn rotate_log_if_needed(config: &Config) {
    let path = config.paths().daemon_log_path();
    let Ok(meta) = std::fs::metadata(&path) else {
        return;
    };
    if meta.len() > MAX_LOG_BYTES {
        let rotated = path.with_extension("log.1");
        if let Err(e) = std::fs::rename(&path, &rotated) {
            eprintln!("log rotation failed: {e}");
        }
    }
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, std::io::Error> {
    use tracing_subscriber::EnvFilter;

    let log_dir = config.paths().daemon_log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let appender = tracing_appender::rolling::never(&log_dir, "qmd.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env("QM_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}
