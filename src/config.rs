//! Run configuration
//!
//! Passed explicitly to the breakpoint loader and the series store; nothing is read from
//! the process environment.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::breakpoints::BreakpointTable;
use crate::error::{AqiError, Result};
use crate::reconcile::DEFAULT_RETENTION_DAYS;

/// Settings of one scoring run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// History horizon in days kept by the reconciler
    pub retention_days: i64,
    /// JSON breakpoint file; the built-in CPCB table when unset
    pub breakpoints_path: Option<PathBuf>,
    /// Location of the persisted series used by [`crate::store::JsonFileStore`]
    pub history_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
            breakpoints_path: None,
            history_path: PathBuf::from("aqi_history.json"),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration; missing keys take their defaults
    ///
    /// # Errors
    ///
    /// * `AqiError::Configuration` - invalid JSON or invalid values
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AqiError::Configuration(format!("Invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    ///
    /// # Errors
    ///
    /// * `AqiError::Storage` - the file cannot be read
    /// * `AqiError::Configuration` - invalid JSON or invalid values
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| AqiError::storage(&format!("reading {}", path.display()), e))?;
        Self::from_json_str(&json)
    }

    /// # Errors
    ///
    /// * `AqiError::Configuration` - non-positive retention or an empty history path
    pub fn validate(&self) -> Result<()> {
        if self.retention_days <= 0 {
            return Err(AqiError::Configuration(format!(
                "retention_days must be positive, got {}",
                self.retention_days
            )));
        }
        if self.history_path.as_os_str().is_empty() {
            return Err(AqiError::Configuration("history_path is empty".into()));
        }
        Ok(())
    }

    #[must_use]
    pub fn retention(&self) -> TimeDelta {
        TimeDelta::days(self.retention_days)
    }

    /// Breakpoint table selected by this configuration
    ///
    /// # Errors
    ///
    /// * `AqiError::Storage` - the breakpoint file cannot be read
    /// * `AqiError::Configuration` - the breakpoint file is invalid
    pub fn load_breakpoints(&self) -> Result<BreakpointTable> {
        match &self.breakpoints_path {
            Some(path) => BreakpointTable::from_path(path),
            None => Ok(BreakpointTable::cpcb()),
        }
    }
}
