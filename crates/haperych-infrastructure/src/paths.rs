//! Path resolution for configuration, ledger data and rendered reports.
//!
//! ```text
//! ~/.config/haperych/          # config directory
//! └── config.toml              # bot configuration
//!
//! ~/.local/share/haperych/     # data directory
//! ├── ledger.toml              # loans, sources, legend sources
//! └── reports/                 # rendered charts
//! ```

use std::path::PathBuf;

use haperych_core::{HaperychError, Result};

const APP_DIR: &str = "haperych";

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV: &str = "HAPERYCH_CONFIG";

pub struct HaperychPaths;

impl HaperychPaths {
    /// The configuration directory (e.g. `~/.config/haperych/`).
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| HaperychError::config("Cannot find config directory"))
    }

    /// The data directory (e.g. `~/.local/share/haperych/`).
    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| HaperychError::config("Cannot find data directory"))
    }

    /// `$HAPERYCH_CONFIG`, else `config.toml` in the config directory.
    pub fn config_file() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn ledger_file() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("ledger.toml"))
    }

    pub fn reports_dir() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("reports"))
    }
}
