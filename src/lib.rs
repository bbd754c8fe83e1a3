//! AQI Scoring Engine
//!
//! This crate turns hourly pollutant samples into Air Quality Index records:
//! - Piecewise-linear sub-indices against a breakpoint table (CPCB built in)
//! - 24 h mean and 8 h rolling-max averaging per pollutant
//! - Reconciliation of re-fetched batches into a retained, persisted history
//!
//! # Example
//!
//! ```rust
//! use aqi_scoring::{score, BreakpointTable, Concentrations, PollutantKind};
//!
//! let table = BreakpointTable::cpcb();
//! let row = Concentrations::from([
//!     (PollutantKind::Pm25, 40.0),
//!     (PollutantKind::Pm10, 120.0),
//! ]);
//! let record = score(&row, &table).unwrap();
//!
//! assert_eq!(record.overall_index, 114);
//! assert_eq!(record.dominant_pollutant, PollutantKind::Pm10);
//! println!("{record}");
//! ```

pub mod air_quality;
pub mod breakpoints;
pub mod config;
pub mod error;
pub mod features;
pub mod pollutant;
pub mod reconcile;
pub mod report;
pub mod sample;
pub mod store;
pub mod window;

pub use air_quality::{AqiCategory, ScoredRecord, score};
pub use breakpoints::{BreakpointRow, BreakpointTable, interpolate};
pub use config::EngineConfig;
pub use error::{AqiError, Result};
pub use features::{FeatureRow, lag_features};
pub use pollutant::{Averaging, Concentrations, PollutantKind};
pub use reconcile::{MergeOutcome, Reconciler};
pub use report::{
    DailyReport, Engine, RunSummary, TrendPoint, daily_reports, latest_daily_report, trend,
};
pub use sample::{RawSample, Sample, SampleSeries, UvBand, Weather};
pub use store::{JsonFileStore, MemoryStore, SeriesStore};

/// Score the latest calendar day of `series` with the built-in CPCB table
///
/// # Arguments
///
/// * `series` - Reconciled hourly samples
///
/// # Returns
///
/// * `Ok(Some(DailyReport))` - The latest 24-hour-class date, when it is also the latest
///   8-hour-class date
/// * `Ok(None)` - The two classes disagree on their latest date, or one has no data
///
/// # Example
///
/// ```rust
/// use aqi_scoring::{today, Concentrations, PollutantKind, Sample, SampleSeries};
/// use chrono::DateTime;
///
/// let sample = Sample::new(
///     DateTime::parse_from_rfc3339("2026-10-18T09:00:00+05:30").unwrap(),
///     Concentrations::from([(PollutantKind::Pm25, 40.0), (PollutantKind::Co, 1.5)]),
/// );
/// let report = today(&SampleSeries::from_unsorted(vec![sample])).unwrap().unwrap();
/// assert_eq!(report.record.overall_index, 73);
/// ```
///
/// # Errors
///
/// * `AqiError::OutOfDomain` - A pollutant of the series cannot be scored
pub fn today(series: &SampleSeries) -> Result<Option<DailyReport>> {
    latest_daily_report(series, &BreakpointTable::cpcb())
}
