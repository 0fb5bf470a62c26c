//! Ledger domain module.
//!
//! - `model`: loans, sources, legend sources and the write models
//! - `repository`: the store trait consumed by the wizard flows

mod model;
mod repository;

pub use model::{LegendSource, Loan, NewLoan, Payment, Settlement, Source, UnsettledLoan};
pub use repository::LedgerRepository;
