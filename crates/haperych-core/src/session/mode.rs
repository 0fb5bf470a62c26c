//! Session mode types for free-text capture.

use serde::{Deserialize, Serialize};

use crate::token::Token;

/// Which free-text capture, if any, is armed for a conversation.
///
/// Exactly one variant holds at a time, so a pending token and a pending
/// alias can never coexist.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SessionMode {
    /// No flow is capturing free text; buttons are addressed by their tokens.
    #[default]
    Idle,
    /// The next text is appended to `token` through the capture bridge.
    AwaitingAppend {
        /// Token the typed value will extend.
        token: Token,
    },
    /// The next text is handed straight to the flow named `alias`.
    AwaitingAlias {
        /// Alias of the text-driven flow.
        alias: String,
    },
}

impl SessionMode {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionMode::Idle)
    }

    pub fn pending_token(&self) -> Option<&Token> {
        match self {
            SessionMode::AwaitingAppend { token } => Some(token),
            _ => None,
        }
    }

    pub fn pending_alias(&self) -> Option<&str> {
        match self {
            SessionMode::AwaitingAlias { alias } => Some(alias),
            _ => None,
        }
    }
}
