//! Wizard flows.
//!
//! A token-driven flow collects its arguments through button presses: the
//! stage is the number of arguments already decoded from the token, and
//! every stage either offers the next choices or, at the last stage, commits
//! the result and returns the session to idle.
//!
//! A text-driven flow collects free text through the alias capture and keeps
//! its own step counter in the session.

mod analytics;
mod comment;
mod loan;
mod naming;
mod payback;

pub use analytics::AnalyticsFlow;
pub use comment::CommentFlow;
pub use loan::LoanFlow;
pub use naming::NameFlow;
pub use payback::PaybackFlow;

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};
use tracing::{error, warn};

use haperych_core::{HaperychError, Result};
use haperych_core::chat::{Choice, Outgoing, Reply};
use haperych_core::config::BotConfig;
use haperych_core::ledger::LedgerRepository;
use haperych_core::report::ReportService;
use haperych_core::session::Session;
use haperych_core::token::{ArgKind, Decoded, Token, decode};

/// Days of the month offered as due dates.
const ANCHOR_DAYS: [u32; 4] = [1, 8, 15, 22];

/// How many due dates a flow offers at once.
pub const ANCHOR_COUNT: usize = 8;

/// Everything a stage handler may touch while handling one event.
pub struct FlowContext<'a> {
    pub session: &'a mut Session,
    pub ledger: &'a dyn LedgerRepository,
    pub reporter: &'a dyn ReportService,
    pub config: &'a BotConfig,
    pub today: NaiveDate,
}

impl FlowContext<'_> {
    /// Resets the session and replies with `text` plus the main keyboard.
    pub fn finish(&mut self, text: impl Into<String>) -> Reply {
        self.session.reset();
        vec![Outgoing::Text {
            text: text.into(),
            keyboard: Some(self.config.keyboard()),
        }]
    }
}

/// A flow driven by button tokens.
#[async_trait]
pub trait Flow: Send + Sync {
    /// Token prefix identifying the flow on the wire.
    fn prefix(&self) -> &'static str;

    /// Name used by menu labels and the default-flow setting.
    fn alias(&self) -> &'static str;

    /// Argument kinds in collection order.
    fn schema(&self) -> &'static [ArgKind];

    /// Handles stage `decoded.success_count()` for `token`.
    ///
    /// `token` carries exactly the decoded arguments.
    async fn handle(
        &self,
        ctx: &mut FlowContext<'_>,
        token: &Token,
        decoded: &Decoded,
    ) -> Result<Reply>;
}

/// A flow driven by free text.
#[async_trait]
pub trait TextFlow: Send + Sync {
    fn alias(&self) -> &'static str;

    /// `text` is `None` when the flow is entered from the menu.
    async fn handle_text(&self, ctx: &mut FlowContext<'_>, text: Option<&str>) -> Result<Reply>;
}

/// Decodes `token` for `flow` and runs the matching stage.
///
/// Overflowing tokens end the flow. A token that fails to decode at
/// position `j` re-runs stage `j` with the good prefix of the token. Stage
/// errors end the flow with a failure message.
pub async fn run(flow: &dyn Flow, ctx: &mut FlowContext<'_>, token: &Token) -> Result<Reply> {
    let decoded = decode(token, flow.schema());

    if decoded.overflow {
        warn!(%token, "token has more arguments than flow '{}' expects", flow.prefix());
        ctx.session.reset();
        return Ok(vec![stale_button()]);
    }

    let effective = match &decoded.failure {
        Some(failure) => {
            warn!(%token, "{failure}; asking again");
            token.truncated(decoded.success_count())
        }
        None => token.clone(),
    };

    match flow.handle(ctx, &effective, &decoded).await {
        Ok(reply) => Ok(reply),
        Err(e) => {
            error!(token = %effective, "flow '{}' failed: {e}", flow.prefix());
            Ok(ctx.finish(failure_text(&e)))
        }
    }
}

/// Reply for a button whose token no longer makes sense.
pub fn stale_button() -> Outgoing {
    Outgoing::text("This button is stale or broken. Start again from the menu.")
}

pub(crate) fn failure_text(e: &HaperychError) -> String {
    if e.is_not_found() {
        format!("Nothing saved: {e}")
    } else {
        "Something went wrong, nothing was saved.".to_string()
    }
}

pub(crate) fn date_label(date: NaiveDate) -> String {
    date.format("%a %Y-%m-%d").to_string()
}

/// One choice per day from `from` to `to`, both included.
pub(crate) fn date_choices(token: &Token, from: NaiveDate, to: NaiveDate) -> Vec<Choice> {
    from.iter_days()
        .take_while(|day| *day <= to)
        .map(|day| Choice::new(date_label(day), token.extend(day)))
        .collect()
}

/// The next `count` quarter-month anchors strictly after `after`.
pub fn anchor_dates(after: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut out = Vec::with_capacity(count);
    let mut month_start = after.with_day(1).unwrap_or(after);
    while out.len() < count {
        for day in ANCHOR_DAYS {
            if let Some(date) = month_start.with_day(day) {
                if date > after && out.len() < count {
                    out.push(date);
                }
            }
        }
        month_start = match month_start.checked_add_months(chrono::Months::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    out
}

pub(crate) fn anchor_choices(token: &Token, after: NaiveDate) -> Vec<Choice> {
    anchor_dates(after, ANCHOR_COUNT)
        .into_iter()
        .map(|day| Choice::new(date_label(day), token.extend(day)))
        .collect()
}

/// `base * percent / 100`, rounded down.
pub(crate) fn percent_of(base: i64, percent: i64) -> Result<i64> {
    base.checked_mul(percent)
        .map(|product| product / 100)
        .ok_or_else(|| HaperychError::internal(format!("{percent}% of {base} overflows")))
}

pub(crate) fn week_around(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(7), today + Duration::days(7))
}
