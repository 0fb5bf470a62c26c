#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use haperych_application::{FlowRegistry, Router};
use haperych_core::chat::{ChatTransport, Choice};
use haperych_core::config::BotConfig;
use haperych_core::ledger::{
    LedgerRepository, LegendSource, Loan, NewLoan, Settlement, Source, UnsettledLoan,
};
use haperych_core::report::{GroupingKey, ReportPeriod, ReportService};
use haperych_core::{HaperychError, Result};

pub const OPERATOR: i64 = 42;

pub fn day(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

pub fn today() -> NaiveDate {
    day(5, 10)
}

/// Store calls seen by the mock ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateLoan(NewLoan),
    Settle(Settlement),
    AddSource(String),
    AddLegend(String),
    Comment(i64, String),
}

#[derive(Default)]
pub struct MockLedger {
    pub calls: Mutex<Vec<Call>>,
    pub sources: Mutex<Vec<Source>>,
    pub legends: Mutex<Vec<LegendSource>>,
    pub unsettled: Mutex<Vec<UnsettledLoan>>,
    pub amounts: Mutex<HashMap<i64, i64>>,
    pub fail_writes: Mutex<bool>,
}

impl MockLedger {
    pub fn seeded() -> Self {
        let ledger = Self::default();
        *ledger.sources.lock().unwrap() = vec![
            Source {
                id: 3,
                name: "Bank".into(),
            },
            Source {
                id: 4,
                name: "Friend".into(),
            },
        ];
        *ledger.legends.lock().unwrap() = vec![LegendSource {
            id: 7,
            name: "Car repair".into(),
        }];
        *ledger.unsettled.lock().unwrap() = vec![UnsettledLoan {
            id: 12,
            source_name: "Bank".into(),
            legend_name: "Car repair".into(),
            loan_date: day(5, 1),
            expected_settle_date: day(5, 22),
            amount: 4500,
            total: 5000,
            comment: None,
        }];
        ledger.amounts.lock().unwrap().insert(12, 5000);
        ledger
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn write(&self, call: Call) -> Result<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(HaperychError::store("disk full"));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl LedgerRepository for MockLedger {
    async fn create_loan(&self, loan: NewLoan) -> Result<i64> {
        self.write(Call::CreateLoan(loan))?;
        Ok(100)
    }

    async fn settle_loan(&self, settlement: Settlement) -> Result<()> {
        self.write(Call::Settle(settlement))
    }

    async fn add_source(&self, name: &str) -> Result<i64> {
        self.write(Call::AddSource(name.to_string()))?;
        Ok(5)
    }

    async fn add_legend_source(&self, name: &str) -> Result<i64> {
        self.write(Call::AddLegend(name.to_string()))?;
        Ok(8)
    }

    async fn update_loan_comment(&self, loan_id: i64, comment: &str) -> Result<()> {
        self.write(Call::Comment(loan_id, comment.to_string()))
    }

    async fn get_sources(&self) -> Result<Vec<Source>> {
        Ok(self.sources.lock().unwrap().clone())
    }

    async fn get_legend_sources(&self) -> Result<Vec<LegendSource>> {
        Ok(self.legends.lock().unwrap().clone())
    }

    async fn get_unsettled_loans(&self) -> Result<Vec<UnsettledLoan>> {
        Ok(self.unsettled.lock().unwrap().clone())
    }

    async fn get_loan_amount(&self, loan_id: i64) -> Result<i64> {
        self.amounts
            .lock()
            .unwrap()
            .get(&loan_id)
            .copied()
            .ok_or_else(|| HaperychError::not_found("loan", loan_id.to_string()))
    }

    async fn list_loans(&self) -> Result<Vec<Loan>> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub struct MockReporter {
    pub requests: Mutex<Vec<(GroupingKey, ReportPeriod)>>,
    pub paths: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl ReportService for MockReporter {
    async fn get_graphic(
        &self,
        grouping: GroupingKey,
        period: ReportPeriod,
    ) -> Result<Vec<PathBuf>> {
        self.requests.lock().unwrap().push((grouping, period));
        Ok(self.paths.lock().unwrap().clone())
    }
}

/// What the recording transport was asked to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text(i64, String),
    Menu(i64, String, Vec<Choice>),
    Edit(i64, String, Vec<Choice>),
    Images(i64, Vec<PathBuf>),
    Ack(i64),
}

#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<Sent>>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(&self, chat_id: i64, text: &str, _keyboard: Option<&[String]>) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Text(chat_id, text.to_string()));
        Ok(())
    }

    async fn send_menu(&self, chat_id: i64, text: &str, choices: &[Choice]) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Menu(chat_id, text.to_string(), choices.to_vec()));
        Ok(())
    }

    async fn edit_last_menu(&self, chat_id: i64, text: &str, choices: &[Choice]) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Edit(chat_id, text.to_string(), choices.to_vec()));
        Ok(())
    }

    async fn send_images(&self, chat_id: i64, paths: &[PathBuf]) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Images(chat_id, paths.to_vec()));
        Ok(())
    }

    async fn acknowledge(&self, chat_id: i64) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Ack(chat_id));
        Ok(())
    }
}

pub struct Harness {
    pub ledger: Arc<MockLedger>,
    pub reporter: Arc<MockReporter>,
    pub router: Router,
}

pub fn harness() -> Harness {
    let ledger = Arc::new(MockLedger::seeded());
    let reporter = Arc::new(MockReporter::default());
    let config = BotConfig {
        operator_id: OPERATOR,
        ..BotConfig::default()
    };
    let router = Router::new(
        FlowRegistry::builtin(),
        ledger.clone(),
        reporter.clone(),
        config,
    )
    .with_clock(Arc::new(today));
    Harness {
        ledger,
        reporter,
        router,
    }
}
