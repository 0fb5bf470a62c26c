//! Terminal rendition of the chat transport.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use colored::Colorize;
use tracing::debug;

use haperych_core::chat::{ChatTransport, Choice};
use haperych_core::token::Token;
use haperych_core::{HaperychError, Result};

/// Prints replies to stdout and remembers the last menu.
#[derive(Default)]
pub struct ConsoleTransport {
    last_menu: Mutex<Vec<Choice>>,
}

impl ConsoleTransport {
    /// Token behind button `number` (1-based) of the last menu.
    pub fn pick(&self, number: usize) -> Option<Token> {
        let menu = self.last_menu.lock().ok()?;
        number
            .checked_sub(1)
            .and_then(|index| menu.get(index))
            .map(|choice| choice.token.clone())
    }

    fn print_menu(&self, text: &str, choices: &[Choice]) -> Result<()> {
        for line in text.lines() {
            println!("{}", line.bright_blue());
        }
        for (index, choice) in choices.iter().enumerate() {
            println!("  {} {}", format!("#{}", index + 1).bright_yellow(), choice.label);
        }
        let mut menu = self
            .last_menu
            .lock()
            .map_err(|e| HaperychError::internal(e.to_string()))?;
        *menu = choices.to_vec();
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn send_text(&self, _chat_id: i64, text: &str, keyboard: Option<&[String]>) -> Result<()> {
        for line in text.lines() {
            println!("{}", line.bright_blue());
        }
        if let Some(labels) = keyboard {
            let row = labels
                .iter()
                .map(|label| format!("[{label}]"))
                .collect::<Vec<_>>()
                .join(" ");
            println!("{}", row.bright_black());
        }
        Ok(())
    }

    async fn send_menu(&self, _chat_id: i64, text: &str, choices: &[Choice]) -> Result<()> {
        self.print_menu(text, choices)
    }

    async fn edit_last_menu(&self, _chat_id: i64, text: &str, choices: &[Choice]) -> Result<()> {
        println!("{}", "(menu updated)".bright_black());
        self.print_menu(text, choices)
    }

    async fn send_images(&self, _chat_id: i64, paths: &[PathBuf]) -> Result<()> {
        for path in paths {
            println!("{} {}", "chart:".green(), path.display());
        }
        Ok(())
    }

    async fn acknowledge(&self, chat_id: i64) -> Result<()> {
        debug!(chat_id, "button acknowledged");
        Ok(())
    }
}
