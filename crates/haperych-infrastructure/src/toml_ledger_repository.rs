//! TOML file-based ledger repository.
//!
//! The whole ledger is one document:
//!
//! ```toml
//! last_loan_id = 2
//! last_source_id = 1
//! last_legend_id = 1
//!
//! [[source]]
//! id = 1
//! name = "Bank"
//!
//! [[loan]]
//! id = 1
//! source_id = 1
//! ...
//! ```
//!
//! Every repository call is one locked read-modify-write of that document.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info};

use haperych_core::ledger::{
    LedgerRepository, LegendSource, Loan, NewLoan, Payment, Settlement, Source, UnsettledLoan,
};
use haperych_core::token::MAX_AMOUNT;
use haperych_core::{HaperychError, Result};

use crate::paths::HaperychPaths;
use crate::storage::{AtomicTomlError, AtomicTomlFile};

/// On-disk shape of the ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerDocument {
    #[serde(default)]
    pub last_loan_id: i64,
    #[serde(default)]
    pub last_source_id: i64,
    #[serde(default)]
    pub last_legend_id: i64,
    #[serde(rename = "source", default)]
    pub sources: Vec<Source>,
    #[serde(rename = "legend_source", default)]
    pub legend_sources: Vec<LegendSource>,
    #[serde(rename = "loan", default)]
    pub loans: Vec<Loan>,
}

impl LedgerDocument {
    fn loan_mut(&mut self, loan_id: i64) -> Result<&mut Loan> {
        self.loans
            .iter_mut()
            .find(|loan| loan.id == loan_id)
            .ok_or_else(|| HaperychError::not_found("loan", loan_id.to_string()))
    }

    fn open_loan_mut(&mut self, loan_id: i64) -> Result<&mut Loan> {
        let loan = self.loan_mut(loan_id)?;
        if loan.is_settled() {
            return Err(HaperychError::store(format!("loan {loan_id} is already settled")));
        }
        Ok(loan)
    }

    fn source_name(&self, id: i64) -> Option<&str> {
        self.sources
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.as_str())
    }

    fn legend_name(&self, id: i64) -> Option<&str> {
        self.legend_sources
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.as_str())
    }
}

/// Ledger repository backed by a single TOML file.
pub struct TomlLedgerRepository {
    file: AtomicTomlFile<LedgerDocument>,
    /// Serialises calls within the process; the file lock covers other processes.
    guard: Mutex<()>,
}

impl TomlLedgerRepository {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            file: AtomicTomlFile::new(path.into()),
            guard: Mutex::new(()),
        }
    }

    /// Repository at the platform data directory.
    pub fn from_default_location() -> Result<Self> {
        Ok(Self::with_path(HaperychPaths::ledger_file()?))
    }

    async fn read(&self) -> Result<LedgerDocument> {
        let _guard = self.guard.lock().await;
        Ok(self.file.load()?.unwrap_or_default())
    }

    async fn write<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut LedgerDocument) -> Result<R>,
    {
        let _guard = self.guard.lock().await;
        self.file
            .update(LedgerDocument::default(), |doc| {
                f(doc).map_err(AtomicTomlError::Rejected)
            })
            .map_err(HaperychError::from)
    }
}

fn validated_name(kind: &str, name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(HaperychError::store(format!("{kind} name must not be empty")));
    }
    Ok(name.to_string())
}

fn check_new_loan(doc: &LedgerDocument, loan: &NewLoan) -> Result<()> {
    if doc.source_name(loan.source_id).is_none() {
        return Err(HaperychError::not_found("source", loan.source_id.to_string()));
    }
    if doc.legend_name(loan.legend_id).is_none() {
        return Err(HaperychError::not_found(
            "legend source",
            loan.legend_id.to_string(),
        ));
    }
    if loan.amount <= 0 {
        return Err(HaperychError::store("loan amount must be positive"));
    }
    if loan.reward < 0 {
        return Err(HaperychError::store("reward must not be negative"));
    }
    if loan.amount > MAX_AMOUNT || loan.reward > MAX_AMOUNT {
        return Err(HaperychError::store(format!(
            "amount and reward must not exceed {MAX_AMOUNT}"
        )));
    }
    if loan.expected_settle_date < loan.loan_date {
        return Err(HaperychError::store(
            "expected settle date is before the loan date",
        ));
    }
    Ok(())
}

#[async_trait]
impl LedgerRepository for TomlLedgerRepository {
    async fn create_loan(&self, loan: NewLoan) -> Result<i64> {
        let previous_loan_id = loan.previous_loan_id;
        let id = self
            .write(|doc| {
                check_new_loan(doc, &loan)?;
                doc.last_loan_id += 1;
                let id = doc.last_loan_id;
                doc.loans.push(Loan {
                    id,
                    source_id: loan.source_id,
                    legend_id: loan.legend_id,
                    loan_date: loan.loan_date,
                    amount: loan.amount,
                    reward: loan.reward,
                    expected_settle_date: loan.expected_settle_date,
                    settle_date: None,
                    comment: loan.comment.clone(),
                    next_loan_id: None,
                    payments: Vec::new(),
                });
                Ok(id)
            })
            .await?;
        info!(loan_id = id, "loan created");

        if let Some(previous) = previous_loan_id {
            // Separate commit: the new loan stays even if linking fails.
            let linked = self
                .write(|doc| {
                    doc.loan_mut(previous)?.next_loan_id = Some(id);
                    Ok(())
                })
                .await;
            if let Err(e) = linked {
                error!(loan_id = id, previous, "failed to link previous loan: {e}");
            }
        }

        Ok(id)
    }

    async fn settle_loan(&self, settlement: Settlement) -> Result<()> {
        self.write(|doc| {
            let loan = doc.open_loan_mut(settlement.loan_id())?;
            match &settlement {
                Settlement::Full { settle_date, .. } => {
                    if *settle_date < loan.loan_date {
                        return Err(HaperychError::store("settle date is before the loan date"));
                    }
                    loan.settle_date = Some(*settle_date);
                }
                Settlement::Extension {
                    settle_date,
                    amount,
                    new_reward,
                    new_expected_settle_date,
                    ..
                } => {
                    if *settle_date < loan.loan_date {
                        return Err(HaperychError::store("payment date is before the loan date"));
                    }
                    if *amount <= 0 || *amount >= loan.outstanding() {
                        return Err(HaperychError::store(format!(
                            "partial payment must be between 1 and {}",
                            loan.outstanding() - 1
                        )));
                    }
                    if !(0..=MAX_AMOUNT).contains(new_reward) {
                        return Err(HaperychError::store(format!(
                            "reward must be between 0 and {MAX_AMOUNT}"
                        )));
                    }
                    let reward = loan
                        .reward
                        .checked_add(*new_reward)
                        .ok_or_else(|| HaperychError::store("reward overflows"))?;
                    if new_expected_settle_date < settle_date {
                        return Err(HaperychError::store(
                            "new settle date is before the payment date",
                        ));
                    }
                    loan.payments.push(Payment {
                        date: *settle_date,
                        amount: *amount,
                    });
                    loan.reward = reward;
                    loan.expected_settle_date = *new_expected_settle_date;
                }
            }
            Ok(())
        })
        .await?;
        info!(loan_id = settlement.loan_id(), ?settlement, "loan settled");
        Ok(())
    }

    async fn add_source(&self, name: &str) -> Result<i64> {
        let name = validated_name("source", name)?;
        self.write(|doc| {
            if doc.sources.iter().any(|s| s.name.eq_ignore_ascii_case(&name)) {
                return Err(HaperychError::store(format!("source '{name}' already exists")));
            }
            doc.last_source_id += 1;
            let id = doc.last_source_id;
            doc.sources.push(Source { id, name });
            Ok(id)
        })
        .await
    }

    async fn add_legend_source(&self, name: &str) -> Result<i64> {
        let name = validated_name("legend source", name)?;
        self.write(|doc| {
            if doc
                .legend_sources
                .iter()
                .any(|s| s.name.eq_ignore_ascii_case(&name))
            {
                return Err(HaperychError::store(format!(
                    "legend source '{name}' already exists"
                )));
            }
            doc.last_legend_id += 1;
            let id = doc.last_legend_id;
            doc.legend_sources.push(LegendSource { id, name });
            Ok(id)
        })
        .await
    }

    async fn update_loan_comment(&self, loan_id: i64, comment: &str) -> Result<()> {
        let comment = comment.trim().to_string();
        self.write(|doc| {
            doc.loan_mut(loan_id)?.comment = (!comment.is_empty()).then_some(comment);
            Ok(())
        })
        .await
    }

    async fn get_sources(&self) -> Result<Vec<Source>> {
        let mut sources = self.read().await?.sources;
        sources.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(sources)
    }

    async fn get_legend_sources(&self) -> Result<Vec<LegendSource>> {
        let mut legends = self.read().await?.legend_sources;
        legends.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(legends)
    }

    async fn get_unsettled_loans(&self) -> Result<Vec<UnsettledLoan>> {
        let doc = self.read().await?;
        let mut loans: Vec<UnsettledLoan> = doc
            .loans
            .iter()
            .filter(|loan| !loan.is_settled())
            .map(|loan| UnsettledLoan {
                id: loan.id,
                source_name: doc.source_name(loan.source_id).unwrap_or("?").to_string(),
                legend_name: doc.legend_name(loan.legend_id).unwrap_or("?").to_string(),
                loan_date: loan.loan_date,
                expected_settle_date: loan.expected_settle_date,
                amount: loan.amount,
                total: loan.outstanding(),
                comment: loan.comment.clone(),
            })
            .collect();
        loans.sort_by_key(|loan| (loan.expected_settle_date, loan.id));
        Ok(loans)
    }

    async fn get_loan_amount(&self, loan_id: i64) -> Result<i64> {
        let doc = self.read().await?;
        let loan = doc
            .loans
            .iter()
            .find(|loan| loan.id == loan_id)
            .ok_or_else(|| HaperychError::not_found("loan", loan_id.to_string()))?;
        if loan.is_settled() {
            return Err(HaperychError::store(format!("loan {loan_id} is already settled")));
        }
        Ok(loan.outstanding())
    }

    async fn list_loans(&self) -> Result<Vec<Loan>> {
        Ok(self.read().await?.loans)
    }
}
