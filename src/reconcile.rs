//! History reconciliation: deduplicating merge plus retention
//!
//! Merging is idempotent: re-delivering a batch replaces every sample of that batch with
//! itself and leaves the series unchanged.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, TimeDelta};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::AqiError;
use crate::sample::{RawSample, Sample, SampleSeries};

/// Default history horizon
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// Result of reconciling a raw batch into the retained series
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub series: SampleSeries,
    /// Samples dropped at ingestion, one error per sample
    pub rejected: Vec<AqiError>,
    /// Retained samples overwritten by a later arrival with the same identity
    pub replaced: usize,
    /// Samples dropped for being older than the retention horizon
    pub expired: usize,
}

/// Merges incoming samples into the retained series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciler {
    retention: TimeDelta,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(TimeDelta::days(DEFAULT_RETENTION_DAYS))
    }
}

impl Reconciler {
    #[must_use]
    pub fn new(retention: TimeDelta) -> Self {
        Self { retention }
    }

    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.retention())
    }

    #[must_use]
    pub fn retention(&self) -> TimeDelta {
        self.retention
    }

    /// Merge already-validated samples into `existing`
    ///
    /// Later arrivals win on identical identity. Samples older than `now - retention`
    /// are dropped and the result is sorted ascending by timestamp.
    #[must_use]
    pub fn merge(
        &self,
        existing: SampleSeries,
        incoming: impl IntoIterator<Item = Sample>,
        now: DateTime<FixedOffset>,
    ) -> SampleSeries {
        self.merge_counted(existing, incoming, now).0
    }

    /// Validate a raw batch, then merge it, reporting every dropped sample
    #[must_use]
    pub fn reconcile(
        &self,
        existing: SampleSeries,
        incoming: impl IntoIterator<Item = RawSample>,
        now: DateTime<FixedOffset>,
    ) -> MergeOutcome {
        let (samples, rejected) = ingest(incoming);
        let (series, replaced, expired) = self.merge_counted(existing, samples, now);

        MergeOutcome {
            series,
            rejected,
            replaced,
            expired,
        }
    }

    fn merge_counted(
        &self,
        existing: SampleSeries,
        incoming: impl IntoIterator<Item = Sample>,
        now: DateTime<FixedOffset>,
    ) -> (SampleSeries, usize, usize) {
        let mut merged: Vec<Sample> = Vec::with_capacity(existing.len());
        let mut positions = HashMap::new();
        let mut replaced = 0;
        let mut incoming_count = 0;

        let existing = existing.into_inner().into_iter();
        let incoming = incoming.into_iter().inspect(|_| incoming_count += 1);

        for sample in existing.chain(incoming) {
            match positions.get(&sample.identity()) {
                Some(&position) => {
                    merged[position] = sample;
                    replaced += 1;
                }
                None => {
                    positions.insert(sample.identity(), merged.len());
                    merged.push(sample);
                }
            }
        }

        let cutoff = now - self.retention;
        let before = merged.len();
        merged.retain(|sample| sample.timestamp >= cutoff);
        let expired = before - merged.len();

        let series = SampleSeries::from_unsorted(merged);
        debug!(
            incoming = incoming_count,
            replaced,
            expired,
            retained = series.len(),
            "merged sample batch"
        );

        (series, replaced, expired)
    }
}

/// Validate raw samples, splitting them into accepted samples and per-sample errors
pub fn ingest(raw: impl IntoIterator<Item = RawSample>) -> (Vec<Sample>, Vec<AqiError>) {
    let mut samples = Vec::new();
    let mut rejected = Vec::new();

    for record in raw {
        match Sample::try_from(record) {
            Ok(sample) => samples.push(sample),
            Err(err) => {
                warn!(error = %err, "dropping malformed sample");
                rejected.push(err);
            }
        }
    }

    (samples, rejected)
}
