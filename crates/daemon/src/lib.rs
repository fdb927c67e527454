// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Quartermaster Daemon library
//!
//! Exposes the daemon's wiring for integration tests; the `qmd` binary
//! is a thin shell over [`lifecycle`].

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod lifecycle;
pub mod notify;

pub use config::Config;
pub use lifecycle::{startup, Daemon, LifecycleError};
pub use notify::DaemonNotify;
