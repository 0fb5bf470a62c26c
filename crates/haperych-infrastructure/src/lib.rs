//! Infrastructure adapters for haperych: file storage, ledger persistence,
//! chart rendering, path resolution and configuration loading.

pub mod config_service;
pub mod paths;
pub mod storage;
pub mod svg_reporter;
pub mod toml_ledger_repository;

pub use config_service::ConfigService;
pub use paths::HaperychPaths;
pub use svg_reporter::SvgReporter;
pub use toml_ledger_repository::{LedgerDocument, TomlLedgerRepository};
