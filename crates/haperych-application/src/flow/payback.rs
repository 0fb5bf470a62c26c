//! Paying a loan back, fully or in part.
//!
//! A payment that covers the outstanding balance closes the loan. A smaller
//! one extends it: the flow goes on to ask for the extension reward and the
//! new due date.

use async_trait::async_trait;
use chrono::Duration;
use tracing::{error, info};

use haperych_core::Result;
use haperych_core::chat::{Choice, Outgoing, Reply};
use haperych_core::ledger::Settlement;
use haperych_core::token::{ArgKind, DATE_FORMAT, Decoded, Token};

use super::{Flow, FlowContext, anchor_choices, date_choices, percent_of};

const SCHEMA: &[ArgKind] = &[
    ArgKind::Id,     // loan
    ArgKind::Date,   // settle date
    ArgKind::Amount, // paid amount
    ArgKind::Reward, // extension reward
    ArgKind::Date,   // new expected settle date
];

pub struct PaybackFlow;

impl PaybackFlow {
    async fn settle(
        &self,
        ctx: &mut FlowContext<'_>,
        token: &Token,
        settlement: Settlement,
        done: String,
    ) -> Result<Reply> {
        let loan_id = settlement.loan_id();
        match ctx.ledger.settle_loan(settlement).await {
            Ok(()) => {
                info!(loan_id, "payback flow finished");
                Ok(ctx.finish(done))
            }
            Err(e) => {
                error!(%token, "settle_loan failed: {e}");
                Ok(ctx.finish("Could not save the payment."))
            }
        }
    }
}

#[async_trait]
impl Flow for PaybackFlow {
    fn prefix(&self) -> &'static str {
        "payback"
    }

    fn alias(&self) -> &'static str {
        "payback"
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
                let loans = ctx.ledger.get_unsettled_loans().await?;
                if loans.is_empty() {
                    return Ok(ctx.finish("Nothing to pay back."));
                }
                let choices = loans
                    .iter()
                    .map(|loan| Choice::new(loan.label(), token.extend(loan.id)))
                    .collect();
                Ok(vec![Outgoing::menu("Which loan?", choices)])
            }
            1 => {
                let from = ctx.today - Duration::days(7);
                Ok(vec![Outgoing::menu(
                    "When was it paid?",
                    date_choices(token, from, ctx.today),
                )])
            }
            2 => {
                let outstanding = ctx.ledger.get_loan_amount(decoded.int(0)?).await?;
                let mut choices = vec![Choice::new(
                    format!("All: {outstanding}"),
                    token.extend(outstanding),
                )];
                choices.extend(
                    ctx.config
                        .amount_presets
                        .iter()
                        .filter(|amount| **amount < outstanding)
                        .map(|amount| Choice::new(amount.to_string(), token.extend(*amount))),
                );
                ctx.session.arm_append(token.clone());
                Ok(vec![Outgoing::menu(
                    format!("{outstanding} outstanding. How much was paid? Pick or type."),
                    choices,
                )])
            }
            3 => {
                let loan_id = decoded.int(0)?;
                let settle_date = decoded.date(1)?;
                let amount = decoded.int(2)?;
                let outstanding = ctx.ledger.get_loan_amount(loan_id).await?;

                if amount >= outstanding {
                    let done = format!(
                        "Loan #{loan_id} settled on {}.",
                        settle_date.format(DATE_FORMAT)
                    );
                    return self
                        .settle(
                            ctx,
                            token,
                            Settlement::Full {
                                loan_id,
                                settle_date,
                            },
                            done,
                        )
                        .await;
                }

                let remaining = outstanding - amount;
                let choices = ctx
                    .config
                    .reward_percent_presets
                    .iter()
                    .map(|percent| {
                        let reward = percent_of(remaining, *percent)?;
                        Ok(Choice::new(format!("{percent}% = {reward}"), token.extend(reward)))
                    })
                    .collect::<Result<Vec<_>>>()?;
                ctx.session.arm_append(token.clone());
                Ok(vec![Outgoing::menu(
                    format!("{remaining} left. Reward for extending? Pick or type."),
                    choices,
                )])
            }
            4 => {
                let settle_date = decoded.date(1)?;
                Ok(vec![Outgoing::menu(
                    "When is the rest due?",
                    anchor_choices(token, settle_date),
                )])
            }
            _ => {
                let loan_id = decoded.int(0)?;
                let amount = decoded.int(2)?;
                let new_expected_settle_date = decoded.date(4)?;
                let done = format!(
                    "Loan #{loan_id}: {amount} paid, the rest is due {}.",
                    new_expected_settle_date.format(DATE_FORMAT)
                );
                self.settle(
                    ctx,
                    token,
                    Settlement::Extension {
                        loan_id,
                        settle_date: decoded.date(1)?,
                        amount,
                        new_reward: decoded.int(3)?,
                        new_expected_settle_date,
                    },
                    done,
                )
                .await
            }
        }
    }
}
