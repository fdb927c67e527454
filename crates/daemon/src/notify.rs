// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime-selected notification sink.
//!
//! The engine is generic over the sink; this enum picks desktop or
//! no-op delivery from configuration without a second set of generics.

use async_trait::async_trait;
use qm_adapters::notify::{DesktopNotifyAdapter, NoOpNotifyAdapter, NotifyAdapter, NotifyError};

#[derive(Clone)]
pub enum DaemonNotify {
    Desktop(DesktopNotifyAdapter),
    NoOp(NoOpNotifyAdapter),
}

impl DaemonNotify {
    pub fn from_config(desktop: bool) -> Self {
        if desktop {
            Self::Desktop(DesktopNotifyAdapter::new())
        } else {
            Self::NoOp(NoOpNotifyAdapter)
        }
    }
}

#[async_trait]
impl NotifyAdapter for DaemonNotify {
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        match self {
            Self::Desktop(sink) => sink.notify(title, message).await,
            Self::NoOp(sink) => sink.notify(title, message).await,
        }
    }
}
