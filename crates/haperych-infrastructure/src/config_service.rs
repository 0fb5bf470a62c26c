//! Configuration service implementation.
//!
//! Loads the bot configuration (menu labels, default flow, operator id) from
//! `config.toml` once and caches it.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use haperych_core::config::BotConfig;
use haperych_core::{HaperychError, Result};
use tracing::{info, warn};

use crate::paths::HaperychPaths;

/// Environment variable overriding the configured operator id.
pub const OPERATOR_ENV: &str = "HAPERYCH_OPERATOR_ID";

/// Loads and caches the bot configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    config: Arc<RwLock<Option<BotConfig>>>,
}

impl ConfigService {
    /// Service over an explicit config file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Service over `$HAPERYCH_CONFIG` or the platform config file.
    pub fn from_default_location() -> Result<Self> {
        Ok(Self::with_path(HaperychPaths::config_file()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the configuration, loading it on first access.
    ///
    /// A missing file yields the defaults; a malformed file is an error.
    pub fn get_config(&self) -> Result<BotConfig> {
        {
            let read_lock = self
                .config
                .read()
                .map_err(|e| HaperychError::internal(e.to_string()))?;
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let mut loaded = Self::load_config(&self.path)?;
        apply_operator_override(&mut loaded, std::env::var(OPERATOR_ENV).ok().as_deref());

        let mut write_lock = self
            .config
            .write()
            .map_err(|e| HaperychError::internal(e.to_string()))?;
        *write_lock = Some(loaded.clone());

        Ok(loaded)
    }

    fn load_config(path: &Path) -> Result<BotConfig> {
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(BotConfig::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: BotConfig = toml::from_str(&content)?;
        info!(path = %path.display(), buttons = config.menu.len(), "configuration loaded");
        Ok(config)
    }
}

fn apply_operator_override(config: &mut BotConfig, raw: Option<&str>) {
    let Some(raw) = raw else {
        return;
    };
    match raw.trim().parse::<i64>() {
        Ok(operator_id) => config.operator_id = operator_id,
        Err(_) => warn!("Cannot read operator id from {OPERATOR_ENV} = '{raw}'"),
    }
}
