//! Reporting domain: grouping keys, periods and the report service seam.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::Result;

/// What the movement chart is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GroupingKey {
    /// Where the money was borrowed.
    Source,
    /// The legend source told about the loan.
    Legend,
}

impl GroupingKey {
    /// Label shown on the grouping menu.
    pub fn label(self) -> &'static str {
        match self {
            GroupingKey::Source => "By source",
            GroupingKey::Legend => "By legend",
        }
    }
}

/// Time window of a report. `None` means "all".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl ReportPeriod {
    pub fn all_time() -> Self {
        Self::default()
    }

    pub fn year(year: i32) -> Self {
        Self {
            year: Some(year),
            month: None,
        }
    }

    pub fn month(year: i32, month: u32) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
        }
    }

    /// Whether `date` falls into this window.
    pub fn contains(&self, date: chrono::NaiveDate) -> bool {
        use chrono::Datelike;
        self.year.is_none_or(|year| date.year() == year)
            && self.month.is_none_or(|month| date.month() == month)
    }
}

/// Produces chart images for a grouping and period.
#[async_trait]
pub trait ReportService: Send + Sync {
    /// Renders the charts and returns the image file paths.
    ///
    /// An empty list means there was nothing to plot.
    async fn get_graphic(&self, grouping: GroupingKey, period: ReportPeriod)
    -> Result<Vec<PathBuf>>;
}
