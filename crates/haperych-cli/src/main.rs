use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracing_subscriber::EnvFilter;

use haperych_application::{Dispatcher, FlowRegistry, Router};
use haperych_core::chat::ChatEvent;
use haperych_core::ledger::LedgerRepository;
use haperych_core::report::ReportService;
use haperych_infrastructure::{ConfigService, HaperychPaths, SvgReporter, TomlLedgerRepository};

mod console;

use console::ConsoleTransport;

#[derive(Parser, Debug)]
#[command(name = "haperych", version, about = "Loan bookkeeping wizard in the terminal")]
struct Args {
    /// Bot configuration file.
    #[arg(long, env = "HAPERYCH_CONFIG")]
    config: Option<PathBuf>,

    /// Ledger file; defaults to the platform data directory.
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Directory for rendered charts.
    #[arg(long)]
    reports: Option<PathBuf>,

    /// Operator id; overrides the configured one.
    #[arg(long)]
    operator: Option<i64>,
}

/// One line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Quit,
    Empty,
    /// `#<n>`: press button n of the last menu.
    Pick(usize),
    /// `!<data>`: press a button with raw data.
    Button(String),
    Text(String),
}

fn parse_line(line: &str) -> Input {
    let trimmed = line.trim();
    match trimmed {
        "" => Input::Empty,
        "quit" | "exit" => Input::Quit,
        _ => {
            if let Some(number) = trimmed.strip_prefix('#').and_then(|n| n.parse().ok()) {
                Input::Pick(number)
            } else if let Some(data) = trimmed.strip_prefix('!').filter(|d| !d.is_empty()) {
                Input::Button(data.to_string())
            } else {
                Input::Text(trimmed.to_string())
            }
        }
    }
}

/// Completes and hints main keyboard labels.
#[derive(Clone)]
struct CliHelper {
    labels: Vec<String>,
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        let candidates = self
            .labels
            .iter()
            .filter(|label| !line.is_empty() && label.starts_with(line))
            .map(|label| Pair {
                display: label.clone(),
                replacement: label.clone(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('#') || line.starts_with('!') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.is_empty() {
            return None;
        }
        self.labels
            .iter()
            .find(|label| label.starts_with(line) && label.len() > line.len())
            .map(|label| label[line.len()..].to_string())
    }
}

impl Validator for CliHelper {}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Terminal front end: every typed line becomes a chat event from the
/// operator, replies are printed as they are delivered.
#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    // ===== Backend Initialization =====
    let config_service = match args.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::from_default_location()?,
    };
    let mut config = config_service
        .get_config()
        .with_context(|| format!("loading {}", config_service.path().display()))?;
    if let Some(operator) = args.operator {
        config.operator_id = operator;
    }
    let operator = config.operator_id;

    let ledger_path = match args.ledger {
        Some(path) => path,
        None => HaperychPaths::ledger_file()?,
    };
    let reports_dir = match args.reports {
        Some(path) => path,
        None => HaperychPaths::reports_dir()?,
    };
    tracing::info!(ledger = %ledger_path.display(), reports = %reports_dir.display(), "starting");

    let ledger: Arc<dyn LedgerRepository> = Arc::new(TomlLedgerRepository::with_path(ledger_path));
    let reporter: Arc<dyn ReportService> = Arc::new(SvgReporter::new(ledger.clone(), reports_dir)?);

    let labels = config.keyboard();
    let router = Router::new(FlowRegistry::builtin(), ledger, reporter, config);
    let transport = Arc::new(ConsoleTransport::default());
    let dispatcher = Dispatcher::spawn(router, transport.clone());

    // ===== REPL Setup =====
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper {
        labels: labels.clone(),
    }));

    println!("{}", "=== Haperych ===".bright_magenta().bold());
    println!(
        "{}",
        "Type a menu label or any text, '#<n>' to press a button, '!<data>' for raw data, 'quit' to exit."
            .bright_black()
    );
    println!("{}", labels.iter().map(|l| format!("[{l}]")).collect::<Vec<_>>().join(" ").bright_black());
    println!();

    // ===== Main REPL Loop =====
    loop {
        let event = match rl.readline(">> ") {
            Ok(line) => match parse_line(&line) {
                Input::Quit => {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
                Input::Empty => continue,
                Input::Pick(number) => {
                    let _ = rl.add_history_entry(line.as_str());
                    match transport.pick(number) {
                        Some(token) => ChatEvent::button(operator, operator, token.as_str()),
                        None => {
                            println!("{}", format!("No button #{number} on the last menu").yellow());
                            continue;
                        }
                    }
                }
                Input::Button(data) => {
                    let _ = rl.add_history_entry(line.as_str());
                    ChatEvent::button(operator, operator, data)
                }
                Input::Text(text) => {
                    let _ = rl.add_history_entry(line.as_str());
                    ChatEvent::text(operator, operator, text)
                }
            },
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        };

        if let Err(e) = dispatcher.submit_and_wait(event).await {
            eprintln!("{}", format!("Error: {e}").red());
            break;
        }
    }

    dispatcher.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prompt_lines() {
        assert_eq!(parse_line("  "), Input::Empty);
        assert_eq!(parse_line("quit"), Input::Quit);
        assert_eq!(parse_line("#2"), Input::Pick(2));
        assert_eq!(parse_line("!loan_3_7"), Input::Button("loan_3_7".into()));
        assert_eq!(parse_line("#two"), Input::Text("#two".into()));
        assert_eq!(parse_line("!"), Input::Text("!".into()));
        assert_eq!(parse_line(" Pay back "), Input::Text("Pay back".into()));
    }

    #[test]
    fn args_accept_paths_and_operator() {
        let args = Args::try_parse_from([
            "haperych",
            "--ledger",
            "/tmp/ledger.toml",
            "--operator",
            "42",
        ])
        .unwrap();
        assert_eq!(args.ledger, Some(PathBuf::from("/tmp/ledger.toml")));
        assert_eq!(args.operator, Some(42));
        assert!(args.reports.is_none());
    }
}
