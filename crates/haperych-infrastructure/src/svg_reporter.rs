//! Movement charts rendered as SVG.
//!
//! Each loan contributes money movements: the borrowed amount leaves on the
//! loan date, partial payments come back on their dates and the remaining
//! balance comes back on the settle date. Movements are grouped by source or
//! legend name and plotted as a running balance, one chart per group.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use minijinja::{AutoEscape, Environment, context};
use serde::Serialize;
use tracing::{debug, info};

use haperych_core::ledger::{LedgerRepository, Loan};
use haperych_core::report::{GroupingKey, ReportPeriod, ReportService};
use haperych_core::token::DATE_FORMAT;
use haperych_core::{HaperychError, Result};

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 400.0;
const PADDING: f64 = 50.0;

const CHART_TEMPLATE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="{{ width }}" height="{{ height }}" viewBox="0 0 {{ width }} {{ height }}">
  <rect width="100%" height="100%" fill="#ffffff"/>
  <text x="{{ padding }}" y="28" font-family="sans-serif" font-size="18">{{ title }}</text>
  <line x1="{{ padding }}" y1="{{ zero_y }}" x2="{{ width - padding }}" y2="{{ zero_y }}" stroke="#999999" stroke-dasharray="4 4"/>
  <polyline fill="none" stroke="#1f77b4" stroke-width="2" points="{{ polyline }}"/>
{%- for point in points %}
  <circle cx="{{ point.x }}" cy="{{ point.y }}" r="3" fill="#1f77b4"><title>{{ point.date }}: {{ point.balance }}</title></circle>
{%- endfor %}
  <text x="{{ padding }}" y="{{ height - 15 }}" font-family="sans-serif" font-size="12">{{ first_date }}</text>
  <text x="{{ width - padding }}" y="{{ height - 15 }}" font-family="sans-serif" font-size="12" text-anchor="end">{{ last_date }}</text>
  <text x="{{ width - padding }}" y="28" font-family="sans-serif" font-size="14" text-anchor="end">balance {{ final_balance }}</text>
</svg>
"##;

/// One signed money movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Movement {
    pub group: String,
    pub date: NaiveDate,
    pub amount: i64,
}

/// Running balance of one group at the end of a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalancePoint {
    pub date: NaiveDate,
    pub balance: i64,
}

#[derive(Debug, Serialize)]
struct ChartPoint {
    x: String,
    y: String,
    date: String,
    balance: i64,
}

/// Expands loans into movements keyed by the group name.
pub fn movements(loans: &[Loan], group_of: impl Fn(&Loan) -> String) -> Vec<Movement> {
    let mut out = Vec::new();
    for loan in loans {
        let group = group_of(loan);
        out.push(Movement {
            group: group.clone(),
            date: loan.loan_date,
            amount: -loan.amount,
        });
        for payment in &loan.payments {
            out.push(Movement {
                group: group.clone(),
                date: payment.date,
                amount: payment.amount,
            });
        }
        if let Some(settle_date) = loan.settle_date {
            out.push(Movement {
                group,
                date: settle_date,
                amount: loan.outstanding(),
            });
        }
    }
    out
}

/// Per-group running balances, one point per day with movement.
pub fn cumulate(movements: &[Movement]) -> BTreeMap<String, Vec<BalancePoint>> {
    let mut daily: BTreeMap<String, BTreeMap<NaiveDate, i64>> = BTreeMap::new();
    for m in movements {
        *daily
            .entry(m.group.clone())
            .or_default()
            .entry(m.date)
            .or_default() += m.amount;
    }

    daily
        .into_iter()
        .map(|(group, days)| {
            let mut balance = 0;
            let points = days
                .into_iter()
                .map(|(date, delta)| {
                    balance += delta;
                    BalancePoint { date, balance }
                })
                .collect();
            (group, points)
        })
        .collect()
}

/// Writes movement charts for the ledger into a reports directory.
pub struct SvgReporter {
    ledger: Arc<dyn LedgerRepository>,
    reports_dir: PathBuf,
    env: Environment<'static>,
}

impl SvgReporter {
    pub fn new(ledger: Arc<dyn LedgerRepository>, reports_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.add_template("chart.svg", CHART_TEMPLATE)
            .map_err(|e| HaperychError::internal(format!("chart template: {e}")))?;
        Ok(Self {
            ledger,
            reports_dir: reports_dir.into(),
            env,
        })
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    fn render(&self, title: &str, points: &[BalancePoint]) -> Result<String> {
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return Err(HaperychError::internal("cannot render an empty chart"));
        };

        let min_balance = points.iter().map(|p| p.balance).min().unwrap_or(0).min(0);
        let mut max_balance = points.iter().map(|p| p.balance).max().unwrap_or(0).max(0);
        if max_balance == min_balance {
            max_balance = min_balance + 1;
        }
        let days = (last.date - first.date).num_days();

        let x_of = |date: NaiveDate| -> f64 {
            if days == 0 {
                WIDTH / 2.0
            } else {
                PADDING + (date - first.date).num_days() as f64 / days as f64 * (WIDTH - 2.0 * PADDING)
            }
        };
        let y_of = |balance: i64| -> f64 {
            let share = (balance - min_balance) as f64 / (max_balance - min_balance) as f64;
            HEIGHT - PADDING - share * (HEIGHT - 2.0 * PADDING)
        };

        let chart_points: Vec<ChartPoint> = points
            .iter()
            .map(|p| ChartPoint {
                x: format!("{:.1}", x_of(p.date)),
                y: format!("{:.1}", y_of(p.balance)),
                date: p.date.format(DATE_FORMAT).to_string(),
                balance: p.balance,
            })
            .collect();
        let polyline = chart_points
            .iter()
            .map(|p| format!("{},{}", p.x, p.y))
            .collect::<Vec<_>>()
            .join(" ");

        let template = self
            .env
            .get_template("chart.svg")
            .map_err(|e| HaperychError::internal(e.to_string()))?;
        template
            .render(context! {
                width => WIDTH,
                height => HEIGHT,
                padding => PADDING,
                title => title,
                zero_y => format!("{:.1}", y_of(0)),
                polyline => polyline,
                points => chart_points,
                first_date => first.date.format(DATE_FORMAT).to_string(),
                last_date => last.date.format(DATE_FORMAT).to_string(),
                final_balance => last.balance,
            })
            .map_err(|e| HaperychError::internal(format!("chart render: {e}")))
    }

    async fn group_names(&self, grouping: GroupingKey) -> Result<HashMap<i64, String>> {
        Ok(match grouping {
            GroupingKey::Source => self
                .ledger
                .get_sources()
                .await?
                .into_iter()
                .map(|s| (s.id, s.name))
                .collect(),
            GroupingKey::Legend => self
                .ledger
                .get_legend_sources()
                .await?
                .into_iter()
                .map(|s| (s.id, s.name))
                .collect(),
        })
    }
}

fn period_tag(period: ReportPeriod) -> String {
    match (period.year, period.month) {
        (Some(year), Some(month)) => format!("{year}-{month:02}"),
        (Some(year), None) => year.to_string(),
        _ => "all".to_string(),
    }
}

fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    let stem = stem.trim_matches('-');
    if stem.is_empty() {
        "group".to_string()
    } else {
        stem.to_lowercase()
    }
}

#[async_trait]
impl ReportService for SvgReporter {
    async fn get_graphic(
        &self,
        grouping: GroupingKey,
        period: ReportPeriod,
    ) -> Result<Vec<PathBuf>> {
        let names = self.group_names(grouping).await?;
        let loans = self.ledger.list_loans().await?;

        let all = movements(&loans, |loan| {
            let id = match grouping {
                GroupingKey::Source => loan.source_id,
                GroupingKey::Legend => loan.legend_id,
            };
            names.get(&id).cloned().unwrap_or_else(|| format!("#{id}"))
        });
        let in_period: Vec<Movement> = all.into_iter().filter(|m| period.contains(m.date)).collect();
        debug!(%grouping, ?period, movements = in_period.len(), "building report");

        let series = cumulate(&in_period);
        if series.is_empty() {
            return Ok(Vec::new());
        }

        std::fs::create_dir_all(&self.reports_dir)?;
        let tag = period_tag(period);
        let mut paths = Vec::with_capacity(series.len());
        for (index, (group, points)) in series.iter().enumerate() {
            let title = format!("{group} ({}, {tag})", grouping.label());
            let svg = self.render(&title, points)?;
            let path = self
                .reports_dir
                .join(format!("{grouping}_{tag}_{index:02}_{}.svg", file_stem(group)));
            std::fs::write(&path, svg)?;
            paths.push(path);
        }

        info!(%grouping, charts = paths.len(), "report written");
        Ok(paths)
    }
}
