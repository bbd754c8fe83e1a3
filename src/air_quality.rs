//! AQI scoring of one row of windowed concentrations

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::breakpoints::BreakpointTable;
use crate::error::{AqiError, Result};
use crate::pollutant::{Concentrations, PollutantKind};

/// Sub-indices of one row, the overall index and the pollutant that set it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub sub_indices: BTreeMap<PollutantKind, u32>,
    pub overall_index: u32,
    pub dominant_pollutant: PollutantKind,
}

impl ScoredRecord {
    #[must_use]
    pub fn category(&self) -> AqiCategory {
        AqiCategory::from_index(self.overall_index)
    }
}

impl fmt::Display for ScoredRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "aqi={} {} dominant={}",
            self.overall_index,
            self.category().label(),
            self.dominant_pollutant
        )?;
        for (pollutant, index) in &self.sub_indices {
            write!(f, " {pollutant}={index}")?;
        }
        Ok(())
    }
}

/// Health band of an overall index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AqiCategory {
    Good,
    Satisfactory,
    Moderate,
    Poor,
    VeryPoor,
    Severe,
}

impl AqiCategory {
    #[must_use]
    pub fn from_index(index: u32) -> Self {
        match index {
            0..=50 => Self::Good,
            51..=100 => Self::Satisfactory,
            101..=200 => Self::Moderate,
            201..=300 => Self::Poor,
            301..=400 => Self::VeryPoor,
            _ => Self::Severe,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Satisfactory => "Satisfactory",
            Self::Moderate => "Moderate",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
            Self::Severe => "Severe",
        }
    }

    /// Legend colour used by the reporting dashboard
    #[must_use]
    pub fn hex_color(&self) -> &'static str {
        match self {
            Self::Good => "#377A07",
            Self::Satisfactory => "#9ACD32",
            Self::Moderate => "#FFC300",
            Self::Poor => "#F58F09",
            Self::VeryPoor => "#C41206",
            Self::Severe => "#810100",
        }
    }
}

/// Score one row of concentrations against `table`
///
/// Each present pollutant is looked up, interpolated and rounded half to even before it is
/// compared, so the first pollutant in enumeration order wins a tie. Absent pollutants are
/// skipped; out-of-range concentrations saturate at the table envelope.
///
/// # Errors
///
/// * `AqiError::OutOfDomain` - the table has no rows for a pollutant present in the row,
///   or a row of the table produces an unrepresentable index
/// * `AqiError::MalformedSample` - the row holds no pollutant, or a non-finite value
pub fn score(concentrations: &Concentrations, table: &BreakpointTable) -> Result<ScoredRecord> {
    let mut sub_indices = BTreeMap::new();
    let mut dominant: Option<(PollutantKind, u32)> = None;

    for (&pollutant, &concentration) in concentrations {
        if !table.covers(pollutant) {
            return Err(AqiError::OutOfDomain(format!(
                "Breakpoint table does not cover {pollutant}"
            )));
        }
        if !concentration.is_finite() {
            return Err(AqiError::MalformedSample(format!(
                "Non-finite {pollutant} concentration {concentration}"
            )));
        }

        let index = round_index(pollutant, table.sub_index(pollutant, concentration)?)?;
        sub_indices.insert(pollutant, index);

        if dominant.is_none_or(|(_, best)| index > best) {
            dominant = Some((pollutant, index));
        }
    }

    let (dominant_pollutant, overall_index) = dominant
        .ok_or_else(|| AqiError::MalformedSample("No tracked pollutant to score".into()))?;

    Ok(ScoredRecord {
        sub_indices,
        overall_index,
        dominant_pollutant,
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_index(pollutant: PollutantKind, raw: f64) -> Result<u32> {
    let rounded = raw.round_ties_even();
    if !rounded.is_finite() || rounded < 0.0 || rounded > f64::from(u32::MAX) {
        return Err(AqiError::OutOfDomain(format!(
            "Sub-index {raw} of {pollutant} is not a valid index"
        )));
    }
    Ok(rounded as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakpoints::BreakpointRow;
    use insta::assert_snapshot;
    use rstest::rstest;

    fn row(values: &[(PollutantKind, f64)]) -> Concentrations {
        values.iter().copied().collect()
    }

    #[test]
    fn shared_boundary_scores_lower_row() {
        let table = BreakpointTable::new([
            BreakpointRow::new(PollutantKind::Pm25, (0.0, 30.0), (0, 50)),
            BreakpointRow::new(PollutantKind::Pm25, (30.0, 60.0), (51, 100)),
        ])
        .unwrap();
        let record = score(&row(&[(PollutantKind::Pm25, 30.0)]), &table).unwrap();
        assert_eq!(record.overall_index, 50);
        assert_eq!(record.dominant_pollutant, PollutantKind::Pm25);
    }

    #[test]
    fn tie_goes_to_earlier_pollutant() {
        // 50 µg/m³ PM10 and 40 µg/m³ NO2 both sit at the top of the Good band
        let table = BreakpointTable::cpcb();
        let concentrations = row(&[(PollutantKind::No2, 40.0), (PollutantKind::Pm10, 50.0)]);
        let record = score(&concentrations, &table).unwrap();
        assert_eq!(record.sub_indices[&PollutantKind::Pm10], 50);
        assert_eq!(record.sub_indices[&PollutantKind::No2], 50);
        assert_eq!(record.dominant_pollutant, PollutantKind::Pm10);

        let concentrations = row(&[(PollutantKind::O3, 50.0), (PollutantKind::Co, 1.0)]);
        let record = score(&concentrations, &table).unwrap();
        assert_eq!(record.dominant_pollutant, PollutantKind::Co);
    }

    #[test]
    fn overall_is_max_of_sub_indices() {
        let record = score(
            &row(&[
                (PollutantKind::Pm25, 40.0),
                (PollutantKind::Pm10, 120.0),
                (PollutantKind::Co, 1.5),
            ]),
            &BreakpointTable::cpcb(),
        )
        .unwrap();
        assert_eq!(
            record.overall_index,
            *record.sub_indices.values().max().unwrap()
        );
        assert_eq!(record.category(), AqiCategory::Moderate);
        assert_snapshot!(record.to_string(), @"aqi=114 Moderate dominant=pm10 pm2_5=66 pm10=114 co=73");
    }

    #[test]
    fn rounds_half_to_even() {
        let table = BreakpointTable::new([BreakpointRow::new(
            PollutantKind::So2,
            (0.0, 10.0),
            (0, 5),
        )])
        .unwrap();
        assert_eq!(score(&row(&[(PollutantKind::So2, 1.0)]), &table).unwrap().overall_index, 0);
        assert_eq!(score(&row(&[(PollutantKind::So2, 3.0)]), &table).unwrap().overall_index, 2);
    }

    #[test]
    fn partial_rows_skip_absent_pollutants() {
        let record = score(
            &row(&[(PollutantKind::Pm25, 40.0), (PollutantKind::So2, 10.0)]),
            &BreakpointTable::cpcb(),
        )
        .unwrap();
        assert_eq!(record.sub_indices.len(), 2);
        assert_eq!(record.overall_index, 66);
        assert_eq!(record.dominant_pollutant, PollutantKind::Pm25);
    }

    #[test]
    fn out_of_range_values_saturate() {
        let table = BreakpointTable::cpcb();
        let record = score(&row(&[(PollutantKind::Pm25, 10_000.0)]), &table).unwrap();
        assert_eq!(record.overall_index, 500);
        let record = score(&row(&[(PollutantKind::Pm25, -3.0)]), &table).unwrap();
        assert_eq!(record.overall_index, 0);
    }

    #[test]
    fn scoring_errors() {
        let pm_only = BreakpointTable::new([BreakpointRow::new(
            PollutantKind::Pm25,
            (0.0, 30.0),
            (0, 50),
        )])
        .unwrap();
        assert!(matches!(
            score(&row(&[(PollutantKind::O3, 10.0)]), &pm_only),
            Err(AqiError::OutOfDomain(_))
        ));
        assert!(matches!(
            score(&Concentrations::new(), &pm_only),
            Err(AqiError::MalformedSample(_))
        ));
        assert!(matches!(
            score(&row(&[(PollutantKind::Pm25, f64::NAN)]), &pm_only),
            Err(AqiError::MalformedSample(_))
        ));
    }

    #[rstest]
    #[case(0, AqiCategory::Good)]
    #[case(50, AqiCategory::Good)]
    #[case(51, AqiCategory::Satisfactory)]
    #[case(100, AqiCategory::Satisfactory)]
    #[case(101, AqiCategory::Moderate)]
    #[case(200, AqiCategory::Moderate)]
    #[case(201, AqiCategory::Poor)]
    #[case(301, AqiCategory::VeryPoor)]
    #[case(400, AqiCategory::VeryPoor)]
    #[case(401, AqiCategory::Severe)]
    #[case(999, AqiCategory::Severe)]
    fn category_bands(#[case] index: u32, #[case] expected: AqiCategory) {
        assert_eq!(AqiCategory::from_index(index), expected);
    }

    #[test]
    fn category_labels_and_colors() {
        assert_eq!(AqiCategory::VeryPoor.label(), "Very Poor");
        assert_eq!(AqiCategory::Good.hex_color(), "#377A07");
    }
}
