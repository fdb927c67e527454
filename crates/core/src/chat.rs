// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded in-memory chat history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default ring capacity.
pub const CHAT_RING_CAPACITY: usize = 200;

/// One chat line as reconstructed from the server log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub at: DateTime<Utc>,
    pub author: String,
    pub text: String,
}

/// Bounded ring of chat messages; the oldest message is evicted when full.
#[derive(Debug, Clone)]
pub struct ChatRing {
    capacity: usize,
    messages: VecDeque<ChatMessage>,
}

impl ChatRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            messages: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        if self.messages.len() == self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Oldest-first copy of the current contents.
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }
}

impl Default for ChatRing {
    fn default() -> Self {
        Self::new(CHAT_RING_CAPACITY)
    }
}

#[cfg(test)]
#[path = "chat_tests.rs"]
mod tests;
