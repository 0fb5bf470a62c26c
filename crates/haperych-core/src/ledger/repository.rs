//! Ledger repository trait.
//!
//! Defines the persistence operations the wizard flows consume.

use async_trait::async_trait;

use super::model::{LegendSource, Loan, NewLoan, Settlement, Source, UnsettledLoan};
use crate::error::Result;

/// An abstract store for loans, sources and legend sources.
///
/// Every method is a single commit. A failed call leaves the stored data
/// untouched; callers never see partial writes.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Opens a loan and returns its id.
    ///
    /// When `previous_loan_id` is set, that loan gets `next_loan_id` pointing
    /// at the new one in a second, separate commit.
    async fn create_loan(&self, loan: NewLoan) -> Result<i64>;

    /// Closes or re-issues a loan.
    async fn settle_loan(&self, settlement: Settlement) -> Result<()>;

    /// Registers a new source and returns its id.
    async fn add_source(&self, name: &str) -> Result<i64>;

    /// Registers a new legend source and returns its id.
    async fn add_legend_source(&self, name: &str) -> Result<i64>;

    /// Replaces the comment of a loan.
    async fn update_loan_comment(&self, loan_id: i64, comment: &str) -> Result<()>;

    /// All sources ordered by name.
    async fn get_sources(&self) -> Result<Vec<Source>>;

    /// All legend sources ordered by name.
    async fn get_legend_sources(&self) -> Result<Vec<LegendSource>>;

    /// Loans without a settle date.
    async fn get_unsettled_loans(&self) -> Result<Vec<UnsettledLoan>>;

    /// Outstanding balance (amount plus reward, less partial payments) of an
    /// open loan.
    async fn get_loan_amount(&self, loan_id: i64) -> Result<i64>;

    /// Every loan, settled or not.
    async fn list_loans(&self) -> Result<Vec<Loan>>;
}
