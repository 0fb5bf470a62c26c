//! Routing of button presses and free text to flows.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use haperych_core::chat::Reply;
use haperych_core::config::BotConfig;
use haperych_core::ledger::LedgerRepository;
use haperych_core::report::ReportService;
use haperych_core::session::{Session, SessionMode};
use haperych_core::token::Token;
use haperych_core::{HaperychError, Result};

use crate::capture::capture;
use crate::flow::{self, FlowContext};
use crate::registry::{FlowEntry, FlowRegistry};

/// Source of "today" for date menus.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Maps inbound events to flow stages over a caller-owned session.
pub struct Router {
    registry: FlowRegistry,
    ledger: Arc<dyn LedgerRepository>,
    reporter: Arc<dyn ReportService>,
    config: BotConfig,
    clock: Clock,
}

impl Router {
    pub fn new(
        registry: FlowRegistry,
        ledger: Arc<dyn LedgerRepository>,
        reporter: Arc<dyn ReportService>,
        config: BotConfig,
    ) -> Self {
        Self {
            registry,
            ledger,
            reporter,
            config,
            clock: Arc::new(|| Local::now().date_naive()),
        }
    }

    /// Replaces the local-date clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    fn context<'a>(&'a self, session: &'a mut Session) -> FlowContext<'a> {
        FlowContext {
            session,
            ledger: self.ledger.as_ref(),
            reporter: self.reporter.as_ref(),
            config: &self.config,
            today: (self.clock)(),
        }
    }

    /// Handles a button press.
    ///
    /// Pressing a button drops any armed capture; the stage handler arms a
    /// new one when it wants text.
    pub async fn route_button(&self, session: &mut Session, data: &str) -> Result<Reply> {
        let token = Token::new(data);
        let flow = self
            .registry
            .by_prefix(token.prefix())
            .ok_or_else(|| HaperychError::UnknownFlow(data.to_string()))?;

        session.reset();
        debug!(chat_id = session.chat_id, %token, "routing button");
        let mut ctx = self.context(session);
        flow::run(flow, &mut ctx, &token).await
    }

    /// Handles free text.
    ///
    /// Precedence: armed token capture, armed alias capture, menu label,
    /// then the default flow.
    pub async fn route_text(&self, session: &mut Session, text: &str) -> Result<Reply> {
        match session.mode().clone() {
            SessionMode::AwaitingAppend { token } => {
                return Ok(capture(session, &self.registry, &token, text));
            }
            SessionMode::AwaitingAlias { alias } => {
                session.reset();
                return match self.registry.by_alias(&alias) {
                    Some(FlowEntry::Text(flow)) => {
                        let mut ctx = self.context(session);
                        flow.handle_text(&mut ctx, Some(text)).await
                    }
                    Some(FlowEntry::Token(_)) | None => Err(HaperychError::UnknownFlow(alias)),
                };
            }
            SessionMode::Idle => {}
        }

        if let Some(alias) = self.config.alias_for_label(text.trim()) {
            info!(chat_id = session.chat_id, alias, "menu selected");
            session.reset();
            session.reset_step(alias);
            return self.enter(session, alias).await;
        }

        let alias = self.config.default_alias.clone();
        self.enter(session, &alias).await
    }

    /// Runs the entry stage of the flow named `alias`.
    pub async fn enter(&self, session: &mut Session, alias: &str) -> Result<Reply> {
        let entry = self
            .registry
            .by_alias(alias)
            .ok_or_else(|| HaperychError::UnknownFlow(alias.to_string()))?;
        let mut ctx = self.context(session);
        match entry {
            FlowEntry::Token(flow) => {
                flow::run(flow, &mut ctx, &Token::for_flow(flow.prefix())).await
            }
            FlowEntry::Text(flow) => flow.handle_text(&mut ctx, None).await,
        }
    }
}
