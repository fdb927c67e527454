// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Poll-based log follower.
//!
//! Reads an append-only UTF-8 log from byte 0 (startup lines matter) and
//! delivers complete `\n`-terminated lines, trimming `\r`. Truncation
//! (rotation) reopens from 0; transient I/O errors retry after the poll
//! interval; a stop signal ends the task.

use std::io::SeekFrom;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Poll interval for EOF waits, open retries, and error backoff.
pub const TAIL_POLL: Duration = Duration::from_millis(250);

/// Follow `path`, sending complete lines into the returned channel until
/// `stop` flips to `true` or the receiver is dropped.
pub fn spawn(path: PathBuf, stop: watch::Receiver<bool>) -> (mpsc::Receiver<String>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(256);
    let handle = tokio::spawn(follow(path, stop, tx));
    (rx, handle)
}

async fn follow(path: PathBuf, mut stop: watch::Receiver<bool>, tx: mpsc::Sender<String>) {
    let mut offset: u64 = 0;
    let mut partial = String::new();
    let mut file: Option<File> = None;

    loop {
        if *stop.borrow() {
            return;
        }

        // (Re)open when needed.
        if file.is_none() {
            match File::open(&path).await {
                Ok(f) => {
                    file = Some(f);
                    offset = 0;
                    partial.clear();
                }
                Err(_) => {
                    if wait_or_stop(&mut stop).await {
                        return;
                    }
                    continue;
                }
            }
        }

        let handle = match file.as_mut() {
            Some(f) => f,
            None => continue,
        };

        // Truncation check: a shrunken file was rotated in place.
        match handle.metadata().await {
            Ok(meta) if meta.len() < offset => {
                tracing::debug!(path = %path.display(), "log truncated, reopening from start");
                file = None;
                continue;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "log stat failed, reopening");
                file = None;
                if wait_or_stop(&mut stop).await {
                    return;
                }
                continue;
            }
        }

        if let Err(e) = handle.seek(SeekFrom::Start(offset)).await {
            tracing::debug!(path = %path.display(), error = %e, "log seek failed, reopening");
            file = None;
            if wait_or_stop(&mut stop).await {
                return;
            }
            continue;
        }

        let mut buf = Vec::new();
        match handle.read_to_end(&mut buf).await {
            Ok(0) => {
                // EOF: wait for more.
                if wait_or_stop(&mut stop).await {
                    return;
                }
            }
            Ok(n) => {
                offset += n as u64;
                partial.push_str(&String::from_utf8_lossy(&buf));
                while let Some(newline) = partial.find('\n') {
                    let line = partial[..newline].trim_end_matches('\r').to_string();
                    partial.drain(..=newline);
                    if tx.send(line).await.is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "log read failed, retrying");
                file = None;
                if wait_or_stop(&mut stop).await {
                    return;
                }
            }
        }
    }
}

/// Sleep one poll interval; `true` when the stop signal fired.
async fn wait_or_stop(stop: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(TAIL_POLL) => *stop.borrow(),
        changed = stop.changed() => changed.is_err() || *stop.borrow(),
    }
}

#[cfg(test)]
#[path = "tailer_tests.rs"]
mod tests;
