//! Loan creation: source, legend, loan date, due date, amount, reward.

use async_trait::async_trait;
use tracing::{error, info};

use haperych_core::{HaperychError, Result};
use haperych_core::chat::{Choice, Outgoing, Reply};
use haperych_core::ledger::NewLoan;
use haperych_core::token::{ArgKind, DATE_FORMAT, Decoded, Token};

use super::{Flow, FlowContext, anchor_choices, date_choices, percent_of, week_around};

const SCHEMA: &[ArgKind] = &[
    ArgKind::Id,     // source
    ArgKind::Id,     // legend source
    ArgKind::Date,   // loan date
    ArgKind::Date,   // expected settle date
    ArgKind::Amount, // amount
    ArgKind::Reward, // reward
];

pub struct LoanFlow;

#[async_trait]
impl Flow for LoanFlow {
    fn prefix(&self) -> &'static str {
        "loan"
    }

    fn alias(&self) -> &'static str {
        "loan"
    }

    fn schema(&self) -> &'static [ArgKind] {
        SCHEMA
    }

    async fn handle(
        &self,
        ctx: &mut FlowContext<'_>,
        token: &Token,
        decoded: &Decoded,
    ) -> Result<Reply> {
        match decoded.success_count() {
            0 => {
                let sources = ctx.ledger.get_sources().await?;
                if sources.is_empty() {
                    return Ok(ctx.finish("No sources yet. Add one first."));
                }
                let choices = sources
                    .into_iter()
                    .map(|s| Choice::new(s.name, token.extend(s.id)))
                    .collect();
                Ok(vec![Outgoing::menu("Where is the money from?", choices)])
            }
            1 => {
                let legends = ctx.ledger.get_legend_sources().await?;
                if legends.is_empty() {
                    return Ok(ctx.finish("No legend sources yet. Add one first."));
                }
                let choices = legends
                    .into_iter()
                    .map(|s| Choice::new(s.name, token.extend(s.id)))
                    .collect();
                Ok(vec![Outgoing::menu("What is the story?", choices)])
            }
            2 => {
                let (from, to) = week_around(ctx.today);
                Ok(vec![Outgoing::menu(
                    "When was it taken?",
                    date_choices(token, from, to),
                )])
            }
            3 => {
                let loan_date = decoded.date(2)?;
                Ok(vec![Outgoing::menu(
                    "When is it due?",
                    anchor_choices(token, loan_date),
                )])
            }
            4 => {
                let choices = ctx
                    .config
                    .amount_presets
                    .iter()
                    .map(|amount| Choice::new(amount.to_string(), token.extend(*amount)))
                    .collect();
                ctx.session.arm_append(token.clone());
                Ok(vec![Outgoing::menu("How much? Pick or type.", choices)])
            }
            5 => {
                let amount = decoded.int(4)?;
                let choices = ctx
                    .config
                    .reward_percent_presets
                    .iter()
                    .map(|percent| {
                        let reward = percent_of(amount, *percent)?;
                        Ok(Choice::new(format!("{percent}% = {reward}"), token.extend(reward)))
                    })
                    .collect::<Result<Vec<_>>>()?;
                ctx.session.arm_append(token.clone());
                Ok(vec![Outgoing::menu(
                    format!("Reward on {amount}? Pick or type."),
                    choices,
                )])
            }
            _ => {
                let loan = NewLoan {
                    source_id: decoded.int(0)?,
                    legend_id: decoded.int(1)?,
                    loan_date: decoded.date(2)?,
                    expected_settle_date: decoded.date(3)?,
                    amount: decoded.int(4)?,
                    reward: decoded.int(5)?,
                    comment: None,
                    previous_loan_id: None,
                };
                let total = loan
                    .amount
                    .checked_add(loan.reward)
                    .ok_or_else(|| HaperychError::internal("loan total overflows"))?;
                let due = loan.expected_settle_date;
                match ctx.ledger.create_loan(loan).await {
                    Ok(id) => {
                        info!(loan_id = id, total, "loan flow finished");
                        Ok(ctx.finish(format!(
                            "Loan #{id} saved: {total} due {}.",
                            due.format(DATE_FORMAT)
                        )))
                    }
                    Err(e) => {
                        error!(%token, "create_loan failed: {e}");
                        Ok(ctx.finish("Could not save the loan."))
                    }
                }
            }
        }
    }
}
