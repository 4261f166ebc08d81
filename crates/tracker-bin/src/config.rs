//! Optional JSON configuration file.
//!
//! Every setting has a command-line (and environment) counterpart; the
//! file is for the values that rarely change between invocations, like
//! the tracked character list. CLI arguments win over the file.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default SQLite database path.
pub const DEFAULT_DATABASE_PATH: &str = "MPlusTracker.db";
/// Default spreadsheet output path.
pub const DEFAULT_EXPORT_PATH: &str = "MPlusTracker.xlsx";
/// Default name of the addon's primary saved global.
pub const DEFAULT_PRIMARY_GLOBAL: &str = "MPT_DB";
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Default number of database open attempts.
pub const DEFAULT_OPEN_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// SavedVariables file to sync from.
    pub savedvars_path: Option<PathBuf>,
    /// SQLite database path.
    pub database_path: PathBuf,
    /// Name of the saved global holding the run list.
    pub primary_global: String,
    /// Conflict policy: "update" or "skip".
    pub on_conflict: String,
    /// Spreadsheet written after a sync, when set.
    pub export_path: Option<PathBuf>,
    /// Characters given their own export sheet.
    pub tracked_characters: Vec<String>,
    /// Database open attempts before giving up.
    pub open_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            savedvars_path: None,
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            primary_global: DEFAULT_PRIMARY_GLOBAL.to_string(),
            on_conflict: "skip".to_string(),
            export_path: None,
            tracked_characters: Vec::new(),
            open_attempts: DEFAULT_OPEN_ATTEMPTS,
        }
    }
}

impl Config {
    /// Load the given file, or defaults when no file was named.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }
}
