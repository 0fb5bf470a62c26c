//! Per-conversation session record.

use std::collections::HashMap;

use tracing::debug;

use super::mode::SessionMode;
use crate::token::Token;

/// Mutable state of one conversation.
///
/// Only the router and the stage handlers it calls touch a session, and they
/// always do so from the dispatcher's single worker.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub chat_id: i64,
    mode: SessionMode,
    /// Internal step counters of text-driven flows, keyed by alias.
    steps: HashMap<String, usize>,
}

impl Session {
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> &SessionMode {
        &self.mode
    }

    /// Waits for one typed value to append to `token`.
    pub fn arm_append(&mut self, token: Token) {
        debug!(chat_id = self.chat_id, %token, "arming token capture");
        self.mode = SessionMode::AwaitingAppend { token };
    }

    /// Waits for one typed value for the text flow `alias`.
    pub fn arm_alias(&mut self, alias: impl Into<String>) {
        let alias = alias.into();
        debug!(chat_id = self.chat_id, %alias, "arming alias capture");
        self.mode = SessionMode::AwaitingAlias { alias };
    }

    /// Back to idle, returning whatever was armed.
    pub fn reset(&mut self) -> SessionMode {
        std::mem::take(&mut self.mode)
    }

    pub fn step(&self, alias: &str) -> usize {
        self.steps.get(alias).copied().unwrap_or(0)
    }

    pub fn set_step(&mut self, alias: &str, step: usize) {
        self.steps.insert(alias.to_string(), step);
    }

    pub fn reset_step(&mut self, alias: &str) {
        self.steps.remove(alias);
    }
}
