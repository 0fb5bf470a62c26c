//! Ledger domain models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A loan row as owned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: i64,
    pub source_id: i64,
    pub legend_id: i64,
    pub loan_date: NaiveDate,
    pub amount: i64,
    pub reward: i64,
    pub expected_settle_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_loan_id: Option<i64>,
    /// Partial payments made before the loan was closed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payments: Vec<Payment>,
}

impl Loan {
    /// Amount owed back: principal plus reward. Saturates on corrupt data.
    pub fn total(&self) -> i64 {
        self.amount.saturating_add(self.reward)
    }

    pub fn paid(&self) -> i64 {
        self.payments
            .iter()
            .fold(0, |sum, p| sum.saturating_add(p.amount))
    }

    /// What is still owed after partial payments.
    pub fn outstanding(&self) -> i64 {
        self.total().saturating_sub(self.paid())
    }

    pub fn is_settled(&self) -> bool {
        self.settle_date.is_some()
    }
}

/// A partial payment recorded by an extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub date: NaiveDate,
    pub amount: i64,
}

/// Where money is borrowed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub name: String,
}

/// The story told about a loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendSource {
    pub id: i64,
    pub name: String,
}

/// Joined read model of a loan that is still open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsettledLoan {
    pub id: i64,
    pub source_name: String,
    pub legend_name: String,
    pub loan_date: NaiveDate,
    pub expected_settle_date: NaiveDate,
    pub amount: i64,
    /// Outstanding balance.
    pub total: i64,
    pub comment: Option<String>,
}

impl UnsettledLoan {
    /// One-line button label, e.g. `Bank / Car repair: 5500 due 2024-06-01`.
    pub fn label(&self) -> String {
        format!(
            "{} / {}: {} due {}",
            self.source_name,
            self.legend_name,
            self.total,
            self.expected_settle_date.format("%Y-%m-%d")
        )
    }
}

/// Everything needed to open a loan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub source_id: i64,
    pub legend_id: i64,
    pub loan_date: NaiveDate,
    pub expected_settle_date: NaiveDate,
    pub amount: i64,
    pub reward: i64,
    pub comment: Option<String>,
    /// Loan this one refinances; linked after the insert.
    pub previous_loan_id: Option<i64>,
}

/// How a payment affects a loan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// The payment covers the outstanding total; the loan is closed.
    Full { loan_id: i64, settle_date: NaiveDate },
    /// A partial payment of `amount`. The same loan row stays open:
    /// `new_reward` is added to its reward and the due date moves to
    /// `new_expected_settle_date`.
    Extension {
        loan_id: i64,
        settle_date: NaiveDate,
        amount: i64,
        new_reward: i64,
        new_expected_settle_date: NaiveDate,
    },
}

impl Settlement {
    pub fn loan_id(&self) -> i64 {
        match self {
            Settlement::Full { loan_id, .. } | Settlement::Extension { loan_id, .. } => *loan_id,
        }
    }
}
