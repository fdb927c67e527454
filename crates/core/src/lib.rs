// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! qm-core: Domain types for the Quartermaster (qm) server control plane

pub mod catalog;
pub mod chat;
pub mod clock;
pub mod component;
pub mod progress;
pub mod server;
pub mod session;
pub mod state;
pub mod time_fmt;
pub mod tokens;
pub mod version;

pub use catalog::{DifficultyDefinition, LanguageListing, WorldDefinition};
pub use chat::{ChatMessage, ChatRing, CHAT_RING_CAPACITY};
pub use clock::{Clock, FakeClock, SystemClock};
pub use component::{Channel, Component, Selection, DEPLOY_ORDER};
pub use progress::ProgressEntry;
pub use server::{ServerRecord, StartParams, FALLBACK_SIDECAR_PORT};
pub use session::ClientSession;
pub use state::SupervisorStatus;
pub use time_fmt::{format_elapsed, format_hms};
pub use tokens::TokenContext;
pub use version::VersionInfo;
