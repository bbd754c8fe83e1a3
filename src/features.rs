//! Lagged feature rows for next-step index forecasting

use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};

use crate::pollutant::Concentrations;
use crate::report::TrendPoint;

const LAGS: usize = 3;

/// One training row: current inputs, the three previous indices and the next one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub timestamp: DateTime<FixedOffset>,
    pub concentrations: Concentrations,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub aqi_lag1: u32,
    pub aqi_lag2: u32,
    pub aqi_lag3: u32,
    /// Overall index of the following trend point
    pub target_aqi: u32,
}

/// Build feature rows from consecutive trend points
///
/// Points without three predecessors or a successor produce no row. Calendar fields use the
/// local time of each timestamp.
#[must_use]
pub fn lag_features(trend: &[TrendPoint]) -> Vec<FeatureRow> {
    trend
        .windows(LAGS + 2)
        .filter_map(|window| {
            let [lag3, lag2, lag1, current, next] = window else {
                return None;
            };
            Some(FeatureRow {
                timestamp: current.timestamp,
                concentrations: current.concentrations.clone(),
                month: current.timestamp.month(),
                day: current.timestamp.day(),
                hour: current.timestamp.hour(),
                aqi_lag1: lag1.record.overall_index,
                aqi_lag2: lag2.record.overall_index,
                aqi_lag3: lag3.record.overall_index,
                target_aqi: next.record.overall_index,
            })
        })
        .collect()
}
