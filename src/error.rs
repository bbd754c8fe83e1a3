//! Error types for AQI scoring and aggregation

use thiserror::Error;

use crate::pollutant::PollutantKind;

/// Result type alias for scoring and aggregation operations
pub type Result<T> = std::result::Result<T, AqiError>;

/// Errors that can occur while loading breakpoints, ingesting samples or scoring rows
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AqiError {
    /// Bad or missing breakpoint data or configuration. Fatal for a run.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A single sample could not be ingested. The sample is dropped, the run continues.
    #[error("Malformed sample: {0}")]
    MalformedSample(String),

    /// A score could not be produced because the table does not cover the input
    #[error("Out of domain: {0}")]
    OutOfDomain(String),

    /// Reading or writing persisted data failed
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AqiError {
    /// Create a new `Configuration` error for a pollutant without breakpoint rows
    #[must_use]
    pub fn missing_breakpoints(pollutant: PollutantKind) -> Self {
        Self::Configuration(format!("No breakpoint rows for {pollutant}"))
    }

    /// Create a new `Configuration` error for a breakpoint row of zero width
    #[must_use]
    pub fn zero_width(pollutant: PollutantKind, concentration: f64) -> Self {
        Self::Configuration(format!(
            "Zero-width breakpoint for {pollutant} at {concentration}"
        ))
    }

    /// Create a new `MalformedSample` error for a missing or unparseable timestamp
    #[must_use]
    pub fn malformed_timestamp(raw: Option<&str>) -> Self {
        match raw {
            Some(value) => Self::MalformedSample(format!("Unparseable timestamp: {value}")),
            None => Self::MalformedSample("Missing timestamp".into()),
        }
    }

    pub(crate) fn storage(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Storage(format!("{context}: {err}"))
    }
}
