//! Runtime settings. Defaults work out of the box; an optional
//! `config.toml` in the data directory and a couple of environment variables
//! can override them.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::models::MAX_RATING;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".santa-reporter";
/// SQLite file holding the string sets.
const DB_FILE_NAME: &str = "kids.sqlite";
const CONFIG_FILE_NAME: &str = "config.toml";

pub const DATA_DIR_ENV: &str = "SANTA_REPORTER_DATA_DIR";
pub const LOG_FILTER_ENV: &str = "SANTA_REPORTER_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the database and the log file live. Resolved from the home
    /// directory when unset.
    pub data_dir: Option<PathBuf>,
    /// `tracing-subscriber` filter directive, e.g. `info` or
    /// `santa_reporter=debug`.
    pub log_filter: String,
    /// Log file name inside the data directory.
    pub log_file: String,
    /// How far PageUp/PageDown move a rating.
    pub rating_step: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_filter: "info".to_string(),
            log_file: "santa-reporter.log".to_string(),
            rating_step: 10,
        }
    }
}

impl Config {
    /// Build the effective configuration: defaults, then the config file in
    /// the data directory, then environment overrides.
    pub fn load() -> Result<Self> {
        let env_dir = env::var_os(DATA_DIR_ENV).map(PathBuf::from);
        let dir = match &env_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };

        let mut config = Self::from_file(&dir.join(CONFIG_FILE_NAME))?;
        if env_dir.is_some() || config.data_dir.is_none() {
            config.data_dir = Some(dir);
        }
        if let Ok(filter) = env::var(LOG_FILTER_ENV) {
            config.log_filter = filter;
        }
        Ok(config)
    }

    /// Parse a TOML config file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("invalid config in {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        if !(1..=MAX_RATING).contains(&config.rating_step) {
            return Err(anyhow!("rating_step must be between 1 and {MAX_RATING}"));
        }
        Ok(config)
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(DB_FILE_NAME))
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(&self.log_file))
    }
}

/// Resolve `~/.santa-reporter`.
fn default_data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}
