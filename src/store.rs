//! Persisted sample series
//!
//! The store only loads and saves; callers serialize concurrent runs against one store.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{AqiError, Result};
use crate::sample::SampleSeries;

/// Backend holding the retained series between runs
pub trait SeriesStore {
    /// # Errors
    ///
    /// * `AqiError::Storage` - the series cannot be read or decoded
    fn load(&self) -> Result<SampleSeries>;

    /// # Errors
    ///
    /// * `AqiError::Storage` - the series cannot be encoded or written
    fn save(&mut self, series: &SampleSeries) -> Result<()>;
}

/// Series kept in memory, for tests and single-process jobs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    series: SampleSeries,
}

impl MemoryStore {
    #[must_use]
    pub fn new(series: SampleSeries) -> Self {
        Self { series }
    }

    #[must_use]
    pub fn series(&self) -> &SampleSeries {
        &self.series
    }
}

impl SeriesStore for MemoryStore {
    fn load(&self) -> Result<SampleSeries> {
        Ok(self.series.clone())
    }

    fn save(&mut self, series: &SampleSeries) -> Result<()> {
        self.series = series.clone();
        Ok(())
    }
}

/// Series stored as a JSON array of samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.history_path.clone())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SeriesStore for JsonFileStore {
    /// A missing file is an empty history
    fn load(&self) -> Result<SampleSeries> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored series, starting empty");
                return Ok(SampleSeries::new());
            }
            Err(e) => {
                return Err(AqiError::storage(
                    &format!("reading {}", self.path.display()),
                    e,
                ));
            }
        };

        let series: SampleSeries = serde_json::from_str(&json)
            .map_err(|e| AqiError::storage(&format!("decoding {}", self.path.display()), e))?;
        debug!(path = %self.path.display(), samples = series.len(), "loaded series");

        // files written by other tools are not guaranteed to be ordered
        Ok(SampleSeries::from_unsorted(series.into_inner()))
    }

    /// Writes to a sibling temporary file first so a failed write never truncates the history
    fn save(&mut self, series: &SampleSeries) -> Result<()> {
        let json = serde_json::to_string_pretty(series)
            .map_err(|e| AqiError::storage("encoding series", e))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json)
            .map_err(|e| AqiError::storage(&format!("writing {}", tmp.display()), e))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| AqiError::storage(&format!("replacing {}", self.path.display()), e))?;

        debug!(path = %self.path.display(), samples = series.len(), "saved series");
        Ok(())
    }
}
