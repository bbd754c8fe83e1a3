//! Scored outputs for reporting, and the single-invocation engine
//!
//! Rows that fail to score are skipped and logged; configuration, coverage and storage
//! problems abort a run.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::air_quality::{ScoredRecord, score};
use crate::breakpoints::BreakpointTable;
use crate::config::EngineConfig;
use crate::error::{AqiError, Result};
use crate::pollutant::Concentrations;
use crate::reconcile::Reconciler;
use crate::sample::{RawSample, SampleSeries};
use crate::store::SeriesStore;
use crate::window::{daily_windowed, latest_daily, trailing_rows};

/// Scored calendar day with the windowed concentrations it was scored from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub record: ScoredRecord,
    pub concentrations: Concentrations,
}

/// Scored trailing values at one sample timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub timestamp: DateTime<FixedOffset>,
    pub record: ScoredRecord,
    pub concentrations: Concentrations,
    /// Third-party index published for the same instant
    pub reported_aqi: Option<u32>,
}

/// Score every calendar date present in both averaging classes
///
/// # Errors
///
/// * `AqiError::OutOfDomain` - the table does not cover a pollutant of the series
pub fn daily_reports(series: &SampleSeries, table: &BreakpointTable) -> Result<Vec<DailyReport>> {
    let mut reports = Vec::new();
    for (date, concentrations) in daily_windowed(series) {
        reports.extend(score_day(date, concentrations, table)?);
    }
    Ok(reports)
}

/// The "today" row, scored
///
/// `None` unless the latest date of the 24-hour class and the latest date of the 8-hour
/// class are the same day.
///
/// # Errors
///
/// * `AqiError::OutOfDomain` - the table does not cover a pollutant of the series
pub fn latest_daily_report(
    series: &SampleSeries,
    table: &BreakpointTable,
) -> Result<Option<DailyReport>> {
    match latest_daily(series) {
        Some((date, concentrations)) => score_day(date, concentrations, table),
        None => Ok(None),
    }
}

fn score_day(
    date: NaiveDate,
    concentrations: Concentrations,
    table: &BreakpointTable,
) -> Result<Option<DailyReport>> {
    match score(&concentrations, table) {
        Ok(record) => Ok(Some(DailyReport {
            date,
            record,
            concentrations,
        })),
        Err(err @ (AqiError::OutOfDomain(_) | AqiError::Configuration(_))) => Err(err),
        Err(err) => {
            warn!(%date, error = %err, "skipping unscorable day");
            Ok(None)
        }
    }
}

/// Score the continuously trailing values at every sample timestamp
///
/// # Errors
///
/// * `AqiError::OutOfDomain` - the table does not cover a pollutant of the series
pub fn trend(series: &SampleSeries, table: &BreakpointTable) -> Result<Vec<TrendPoint>> {
    let mut points = Vec::new();

    for (sample, concentrations) in series.iter().zip(trailing_rows(series)) {
        if concentrations.is_empty() {
            continue;
        }
        match score(&concentrations, table) {
            Ok(record) => points.push(TrendPoint {
                timestamp: sample.timestamp,
                record,
                concentrations,
                reported_aqi: sample.reported_aqi,
            }),
            Err(err @ (AqiError::OutOfDomain(_) | AqiError::Configuration(_))) => return Err(err),
            Err(err) => {
                warn!(timestamp = %sample.timestamp, error = %err, "skipping unscorable trend row");
            }
        }
    }
    Ok(points)
}

/// Outputs of one engine run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Reconciled series as persisted
    pub series: SampleSeries,
    /// Samples of the batch dropped at ingestion
    pub rejected: Vec<AqiError>,
    pub daily: Vec<DailyReport>,
    /// Today's row, see [`latest_daily_report`]
    pub today: Option<DailyReport>,
    pub trend: Vec<TrendPoint>,
}

impl RunSummary {
    #[must_use]
    pub fn latest_daily(&self) -> Option<&DailyReport> {
        self.today.as_ref()
    }
}

/// Load, reconcile, persist and score: one scheduled invocation
#[derive(Debug)]
pub struct Engine<S: SeriesStore> {
    table: BreakpointTable,
    reconciler: Reconciler,
    store: S,
}

impl<S: SeriesStore> Engine<S> {
    /// # Errors
    ///
    /// * `AqiError::Configuration` - invalid configuration or breakpoint file
    /// * `AqiError::Storage` - the breakpoint file cannot be read
    pub fn new(config: &EngineConfig, store: S) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_table(
            config.load_breakpoints()?,
            Reconciler::from_config(config),
            store,
        ))
    }

    #[must_use]
    pub fn with_table(table: BreakpointTable, reconciler: Reconciler, store: S) -> Self {
        Self {
            table,
            reconciler,
            store,
        }
    }

    #[must_use]
    pub fn table(&self) -> &BreakpointTable {
        &self.table
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Merge `incoming` into the stored series, save it and score the result
    ///
    /// Re-running with the same batch and `now` yields the same summary and stored series.
    ///
    /// # Errors
    ///
    /// * `AqiError::Storage` - loading or saving the series failed
    /// * `AqiError::OutOfDomain` - the table does not cover a pollutant of the series
    pub fn run(
        &mut self,
        incoming: impl IntoIterator<Item = RawSample>,
        now: DateTime<FixedOffset>,
    ) -> Result<RunSummary> {
        let existing = self.store.load()?;
        let outcome = self.reconciler.reconcile(existing, incoming, now);
        self.store.save(&outcome.series)?;

        let daily = daily_reports(&outcome.series, &self.table)?;
        let today = latest_daily_report(&outcome.series, &self.table)?;
        let trend = trend(&outcome.series, &self.table)?;

        info!(
            samples = outcome.series.len(),
            rejected = outcome.rejected.len(),
            days = daily.len(),
            today_aqi = today.as_ref().map(|d| d.record.overall_index),
            "scoring run complete"
        );

        Ok(RunSummary {
            series: outcome.series,
            rejected: outcome.rejected,
            daily,
            today,
            trend,
        })
    }
}
