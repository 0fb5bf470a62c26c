//! Movement charts: grouping, year, month.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::Datelike;
use tracing::error;

use haperych_core::chat::{Choice, Outgoing, Reply};
use haperych_core::report::{GroupingKey, ReportPeriod};
use haperych_core::token::{ALL_PERIODS, ArgKind, Decoded, Token};
use haperych_core::{HaperychError, Result};

use super::{Flow, FlowContext};

const SCHEMA: &[ArgKind] = &[ArgKind::Grouping, ArgKind::Period, ArgKind::Period];

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub struct AnalyticsFlow;

impl AnalyticsFlow {
    /// Years that have any loan movement, plus the current one.
    async fn known_years(&self, ctx: &FlowContext<'_>) -> Result<BTreeSet<i32>> {
        let mut years = BTreeSet::from([ctx.today.year()]);
        for loan in ctx.ledger.list_loans().await? {
            years.insert(loan.loan_date.year());
            years.extend(loan.payments.iter().map(|p| p.date.year()));
            years.extend(loan.settle_date.map(|d| d.year()));
        }
        Ok(years)
    }

    async fn report(
        &self,
        ctx: &mut FlowContext<'_>,
        grouping: GroupingKey,
        period: ReportPeriod,
    ) -> Result<Reply> {
        match ctx.reporter.get_graphic(grouping, period).await {
            Ok(paths) if paths.is_empty() => Ok(ctx.finish("No data for that period.")),
            Ok(paths) => {
                let mut reply = vec![Outgoing::Images { paths }];
                reply.extend(ctx.finish(grouping.label()));
                Ok(reply)
            }
            Err(e) => {
                error!(%grouping, ?period, "get_graphic failed: {e}");
                Ok(ctx.finish("Could not build the report."))
            }
        }
    }
}

fn to_year(value: i64) -> Result<i32> {
    i32::try_from(value).map_err(|_| HaperychError::internal(format!("year {value} out of range")))
}

fn to_month(value: i64) -> Result<u32> {
    u32::try_from(value)
        .ok()
        .filter(|month| (1..=12).contains(month))
        .ok_or_else(|| HaperychError::internal(format!("month {value} out of range")))
}

#[async_trait]
impl Flow for AnalyticsFlow {
    fn prefix(&self) -> &'static str {
        "analytics"
    }

    fn alias(&self) -> &'static str {
        "analytics"
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
                let choices = [GroupingKey::Source, GroupingKey::Legend]
                    .into_iter()
                    .map(|key| Choice::new(key.label(), token.extend(key)))
                    .collect();
                Ok(vec![Outgoing::menu("Group movements how?", choices)])
            }
            1 => {
                let mut choices = vec![Choice::new("All time", token.extend(ALL_PERIODS))];
                choices.extend(
                    self.known_years(ctx)
                        .await?
                        .into_iter()
                        .rev()
                        .map(|year| Choice::new(year.to_string(), token.extend(i64::from(year)))),
                );
                Ok(vec![Outgoing::menu("Which year?", choices)])
            }
            2 => {
                let grouping = decoded.grouping(0)?;
                let year = decoded.int(1)?;
                if year == ALL_PERIODS {
                    return self.report(ctx, grouping, ReportPeriod::all_time()).await;
                }
                let mut choices = vec![Choice::new("Whole year", token.extend(ALL_PERIODS))];
                choices.extend(
                    MONTHS
                        .iter()
                        .zip(1i64..)
                        .map(|(name, month)| Choice::new(*name, token.extend(month))),
                );
                Ok(vec![Outgoing::menu(format!("Which month of {year}?"), choices)])
            }
            _ => {
                let grouping = decoded.grouping(0)?;
                let year = decoded.int(1)?;
                let month = decoded.int(2)?;
                let period = match (year, month) {
                    (ALL_PERIODS, _) => ReportPeriod::all_time(),
                    (year, ALL_PERIODS) => ReportPeriod::year(to_year(year)?),
                    (year, month) => ReportPeriod::month(to_year(year)?, to_month(month)?),
                };
                self.report(ctx, grouping, period).await
            }
        }
    }
}
