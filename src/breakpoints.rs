//! Breakpoint tables and sub-index interpolation
//!
//! A table holds, per pollutant, ascending concentration ranges mapped onto index ranges.
//! Concentrations outside a pollutant's envelope saturate at the first or last row.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AqiError, Result};
use crate::pollutant::PollutantKind;

/// Index bands shared by every pollutant of the CPCB table
const CPCB_INDEX_BANDS: [(u32, u32); 6] = [
    (0, 50),
    (51, 100),
    (101, 200),
    (201, 300),
    (301, 400),
    (401, 500),
];

/// CPCB concentration bands per pollutant. Last band upper bounds cap the severe range.
const CPCB_CONCENTRATIONS: [(PollutantKind, [(f64, f64); 6]); 6] = [
    (
        PollutantKind::Pm25,
        [
            (0.0, 30.0),
            (31.0, 60.0),
            (61.0, 90.0),
            (91.0, 120.0),
            (121.0, 250.0),
            (251.0, 500.0),
        ],
    ),
    (
        PollutantKind::Pm10,
        [
            (0.0, 50.0),
            (51.0, 100.0),
            (101.0, 250.0),
            (251.0, 350.0),
            (351.0, 430.0),
            (431.0, 1000.0),
        ],
    ),
    (
        PollutantKind::So2,
        [
            (0.0, 40.0),
            (41.0, 80.0),
            (81.0, 380.0),
            (381.0, 800.0),
            (801.0, 1600.0),
            (1601.0, 2400.0),
        ],
    ),
    (
        PollutantKind::No2,
        [
            (0.0, 40.0),
            (41.0, 80.0),
            (81.0, 180.0),
            (181.0, 280.0),
            (281.0, 400.0),
            (401.0, 1000.0),
        ],
    ),
    (
        PollutantKind::Co,
        [
            (0.0, 1.0),
            (1.1, 2.0),
            (2.1, 10.0),
            (10.1, 17.0),
            (17.1, 34.0),
            (34.1, 50.0),
        ],
    ),
    (
        PollutantKind::O3,
        [
            (0.0, 50.0),
            (51.0, 100.0),
            (101.0, 168.0),
            (169.0, 208.0),
            (209.0, 748.0),
            (749.0, 1000.0),
        ],
    ),
];

/// One concentration range of a pollutant and the index range it maps onto
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakpointRow {
    pub pollutant: PollutantKind,
    pub low_concentration: f64,
    #[serde(alias = "upper_concentration")]
    pub high_concentration: f64,
    #[serde(alias = "low_aqi")]
    pub low_index: u32,
    #[serde(alias = "upper_aqi", alias = "high_aqi")]
    pub high_index: u32,
}

impl BreakpointRow {
    #[must_use]
    pub fn new(
        pollutant: PollutantKind,
        (low_concentration, high_concentration): (f64, f64),
        (low_index, high_index): (u32, u32),
    ) -> Self {
        Self {
            pollutant,
            low_concentration,
            high_concentration,
            low_index,
            high_index,
        }
    }

    /// Whether `concentration` lies inside the row, both bounds inclusive
    #[must_use]
    pub fn contains(&self, concentration: f64) -> bool {
        self.low_concentration <= concentration && concentration <= self.high_concentration
    }

    /// Saturate `concentration` into the row's range
    #[must_use]
    pub fn clamp(&self, concentration: f64) -> f64 {
        concentration.clamp(self.low_concentration, self.high_concentration)
    }

    fn validate(&self) -> Result<()> {
        if !self.low_concentration.is_finite() || !self.high_concentration.is_finite() {
            return Err(AqiError::Configuration(format!(
                "Non-finite breakpoint bounds for {}",
                self.pollutant
            )));
        }
        if self.high_concentration < self.low_concentration {
            return Err(AqiError::Configuration(format!(
                "Inverted breakpoint for {}: {} > {}",
                self.pollutant, self.low_concentration, self.high_concentration
            )));
        }
        if self.high_concentration == self.low_concentration {
            return Err(AqiError::zero_width(self.pollutant, self.low_concentration));
        }
        Ok(())
    }
}

/// Linear interpolation of `concentration` between the index bounds of `row`
///
/// The result is not rounded and not clamped; callers that need saturation clamp the
/// concentration into the row first (see [`BreakpointTable::sub_index`]).
///
/// # Errors
///
/// * `AqiError::Configuration` - the row has zero width
pub fn interpolate(concentration: f64, row: &BreakpointRow) -> Result<f64> {
    let width = row.high_concentration - row.low_concentration;
    if width == 0.0 {
        return Err(AqiError::zero_width(row.pollutant, row.low_concentration));
    }

    let index_span = f64::from(row.high_index) - f64::from(row.low_index);
    Ok((index_span / width) * (concentration - row.low_concentration) + f64::from(row.low_index))
}

/// Immutable per-pollutant breakpoint rows, sorted ascending by low concentration
#[derive(Debug, Clone, PartialEq)]
pub struct BreakpointTable {
    rows: BTreeMap<PollutantKind, Vec<BreakpointRow>>,
}

impl BreakpointTable {
    /// Build a table from rows in any order
    ///
    /// # Errors
    ///
    /// * `AqiError::Configuration` - no rows, a row with non-finite, inverted or zero-width
    ///   bounds, or two rows of one pollutant overlapping beyond a shared boundary
    pub fn new(rows: impl IntoIterator<Item = BreakpointRow>) -> Result<Self> {
        let mut grouped: BTreeMap<PollutantKind, Vec<BreakpointRow>> = BTreeMap::new();
        for row in rows {
            row.validate()?;
            grouped.entry(row.pollutant).or_default().push(row);
        }

        if grouped.is_empty() {
            return Err(AqiError::Configuration("Empty breakpoint table".into()));
        }

        for (pollutant, rows) in &mut grouped {
            rows.sort_by(|a, b| a.low_concentration.total_cmp(&b.low_concentration));
            for pair in rows.windows(2) {
                if pair[1].low_concentration < pair[0].high_concentration {
                    return Err(AqiError::Configuration(format!(
                        "Overlapping breakpoints for {pollutant}: {}..{} and {}..{}",
                        pair[0].low_concentration,
                        pair[0].high_concentration,
                        pair[1].low_concentration,
                        pair[1].high_concentration
                    )));
                }
            }
        }

        Ok(Self { rows: grouped })
    }

    /// Indian National Air Quality Index (CPCB) table for all six pollutants
    #[must_use]
    pub fn cpcb() -> Self {
        let rows: Vec<BreakpointRow> = CPCB_CONCENTRATIONS
            .iter()
            .flat_map(|(pollutant, bands)| {
                bands
                    .iter()
                    .zip(CPCB_INDEX_BANDS)
                    .map(move |(concentration, index)| {
                        BreakpointRow::new(*pollutant, *concentration, index)
                    })
            })
            .collect();
        Self { rows: Self::group_sorted(rows) }
    }

    /// Table built without validation, for exercising the scoring error paths
    #[cfg(test)]
    pub(crate) fn from_rows_unchecked(rows: Vec<BreakpointRow>) -> Self {
        Self { rows: Self::group_sorted(rows) }
    }

    fn group_sorted(rows: Vec<BreakpointRow>) -> BTreeMap<PollutantKind, Vec<BreakpointRow>> {
        let mut grouped: BTreeMap<PollutantKind, Vec<BreakpointRow>> = BTreeMap::new();
        for row in rows {
            grouped.entry(row.pollutant).or_default().push(row);
        }
        grouped
    }

    /// Parse a JSON array of breakpoint rows
    ///
    /// # Errors
    ///
    /// * `AqiError::Configuration` - invalid JSON or an invalid table
    pub fn from_json_str(json: &str) -> Result<Self> {
        let rows: Vec<BreakpointRow> = serde_json::from_str(json)
            .map_err(|e| AqiError::Configuration(format!("Invalid breakpoint file: {e}")))?;
        Self::new(rows)
    }

    /// Load a JSON breakpoint file
    ///
    /// # Errors
    ///
    /// * `AqiError::Storage` - the file cannot be read
    /// * `AqiError::Configuration` - invalid JSON or an invalid table
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| AqiError::storage(&format!("reading {}", path.display()), e))?;
        Self::from_json_str(&json)
    }

    /// Pollutants the table has rows for
    pub fn pollutants(&self) -> impl Iterator<Item = PollutantKind> + '_ {
        self.rows.keys().copied()
    }

    /// Whether the table has rows for `pollutant`
    #[must_use]
    pub fn covers(&self, pollutant: PollutantKind) -> bool {
        self.rows.get(&pollutant).is_some_and(|rows| !rows.is_empty())
    }

    /// Rows of `pollutant`, ascending
    #[must_use]
    pub fn rows(&self, pollutant: PollutantKind) -> &[BreakpointRow] {
        self.rows.get(&pollutant).map(Vec::as_slice).unwrap_or_default()
    }

    /// Row enclosing `concentration`
    ///
    /// The first row in ascending order whose upper bound is not below the concentration
    /// wins, so a value on a shared boundary resolves to the lower row. Values below the
    /// envelope, or inside a gap between published rows, resolve to the next row up; values
    /// above the envelope resolve to the last row.
    ///
    /// # Errors
    ///
    /// * `AqiError::Configuration` - the table has no rows for `pollutant`
    pub fn lookup(&self, pollutant: PollutantKind, concentration: f64) -> Result<&BreakpointRow> {
        let rows = self.rows(pollutant);
        let last = rows
            .last()
            .ok_or_else(|| AqiError::missing_breakpoints(pollutant))?;

        Ok(rows
            .iter()
            .find(|row| concentration <= row.high_concentration)
            .unwrap_or(last))
    }

    /// Unrounded sub-index of `concentration`, saturated at the row bounds
    ///
    /// # Errors
    ///
    /// * `AqiError::Configuration` - no rows for `pollutant`, or a zero-width row
    pub fn sub_index(&self, pollutant: PollutantKind, concentration: f64) -> Result<f64> {
        let row = self.lookup(pollutant, concentration)?;
        interpolate(row.clamp(concentration), row)
    }
}
