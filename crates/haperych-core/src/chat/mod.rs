//! Chat transport seam: inbound events and outbound messages.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::token::Token;

/// What the operator did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// An inline button was pressed; `data` is its token.
    Button { data: String },
    /// A message was typed (or a reply-keyboard label tapped).
    Text { text: String },
}

/// One inbound event from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    pub chat_id: i64,
    pub sender_id: i64,
    pub kind: EventKind,
}

impl ChatEvent {
    pub fn button(chat_id: i64, sender_id: i64, data: impl Into<String>) -> Self {
        Self {
            chat_id,
            sender_id,
            kind: EventKind::Button { data: data.into() },
        }
    }

    pub fn text(chat_id: i64, sender_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            sender_id,
            kind: EventKind::Text { text: text.into() },
        }
    }
}

/// An inline button: what the operator sees and what comes back when tapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub token: Token,
}

impl Choice {
    pub fn new(label: impl Into<String>, token: Token) -> Self {
        Self {
            label: label.into(),
            token,
        }
    }
}

/// A message the core asks the transport to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    /// Plain text, optionally with the persistent reply keyboard.
    Text {
        text: String,
        keyboard: Option<Vec<String>>,
    },
    /// Text with inline buttons.
    Menu { text: String, choices: Vec<Choice> },
    /// Replace the last inline menu in place.
    EditMenu { text: String, choices: Vec<Choice> },
    /// A set of images.
    Images { paths: Vec<PathBuf> },
}

impl Outgoing {
    pub fn text(text: impl Into<String>) -> Self {
        Outgoing::Text {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn menu(text: impl Into<String>, choices: Vec<Choice>) -> Self {
        Outgoing::Menu {
            text: text.into(),
            choices,
        }
    }

    /// Inline choices carried by this message, if it is a menu.
    pub fn choices(&self) -> &[Choice] {
        match self {
            Outgoing::Menu { choices, .. } | Outgoing::EditMenu { choices, .. } => choices,
            _ => &[],
        }
    }
}

/// Ordered messages produced by handling one event.
pub type Reply = Vec<Outgoing>;

/// Delivers outbound messages.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<&[String]>) -> Result<()>;

    async fn send_menu(&self, chat_id: i64, text: &str, choices: &[Choice]) -> Result<()>;

    async fn edit_last_menu(&self, chat_id: i64, text: &str, choices: &[Choice]) -> Result<()>;

    async fn send_images(&self, chat_id: i64, paths: &[PathBuf]) -> Result<()>;

    /// Stops the transport's "loading" indicator for a pressed button.
    async fn acknowledge(&self, chat_id: i64) -> Result<()>;

    /// Sends one outgoing message through the matching method.
    async fn deliver(&self, chat_id: i64, message: &Outgoing) -> Result<()> {
        match message {
            Outgoing::Text { text, keyboard } => {
                self.send_text(chat_id, text, keyboard.as_deref()).await
            }
            Outgoing::Menu { text, choices } => self.send_menu(chat_id, text, choices).await,
            Outgoing::EditMenu { text, choices } => {
                self.edit_last_menu(chat_id, text, choices).await
            }
            Outgoing::Images { paths } => self.send_images(chat_id, paths).await,
        }
    }
}
