//! Tracked pollutants and their regulatory averaging periods

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::AqiError;

/// Concentrations of one observation or one windowed row, keyed in enumeration order
pub type Concentrations = BTreeMap<PollutantKind, f64>;

/// Pollutants scored by the index
///
/// Declaration order is the tie-break order for the dominant pollutant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PollutantKind {
    /// Fine particulate matter, µg/m³
    #[serde(rename = "pm2_5")]
    Pm25,
    /// Coarse particulate matter, µg/m³
    #[serde(rename = "pm10")]
    Pm10,
    /// Sulphur dioxide, µg/m³
    #[serde(rename = "so2")]
    So2,
    /// Nitrogen dioxide, µg/m³
    #[serde(rename = "no2")]
    No2,
    /// Carbon monoxide, mg/m³
    #[serde(rename = "co")]
    Co,
    /// Ozone, µg/m³
    #[serde(rename = "o3")]
    O3,
}

impl PollutantKind {
    /// All pollutants in enumeration order
    pub const ALL: [Self; 6] = [
        Self::Pm25,
        Self::Pm10,
        Self::So2,
        Self::No2,
        Self::Co,
        Self::O3,
    ];

    /// Wire name of the pollutant
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pm25 => "pm2_5",
            Self::Pm10 => "pm10",
            Self::So2 => "so2",
            Self::No2 => "no2",
            Self::Co => "co",
            Self::O3 => "o3",
        }
    }

    /// Averaging period the standard scores this pollutant over
    #[must_use]
    pub fn averaging(&self) -> Averaging {
        match self {
            Self::Pm25 | Self::Pm10 | Self::So2 | Self::No2 => Averaging::TwentyFourHourMean,
            Self::Co | Self::O3 => Averaging::EightHourMax,
        }
    }

    /// Unit the breakpoint tables expect concentrations in
    #[must_use]
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Co => "mg/m³",
            _ => "µg/m³",
        }
    }
}

impl fmt::Display for PollutantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PollutantKind {
    type Err = AqiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pm2_5" | "pm25" | "pm2.5" => Ok(Self::Pm25),
            "pm10" => Ok(Self::Pm10),
            "so2" | "sulphur_dioxide" | "sulfur_dioxide" => Ok(Self::So2),
            "no2" | "nitrogen_dioxide" => Ok(Self::No2),
            "co" | "carbon_monoxide" => Ok(Self::Co),
            "o3" | "ozone" => Ok(Self::O3),
            other => Err(AqiError::Configuration(format!(
                "Unknown pollutant: {other}"
            ))),
        }
    }
}

/// Regulatory averaging class of a pollutant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Averaging {
    /// Trailing 24-hour mean, or the calendar-day mean when reported daily
    TwentyFourHourMean,
    /// Trailing 8-hour mean, reported daily as the maximum of that rolling mean
    EightHourMax,
}

impl Averaging {
    /// Length of the trailing window
    #[must_use]
    pub fn window(&self) -> TimeDelta {
        match self {
            Self::TwentyFourHourMean => TimeDelta::hours(24),
            Self::EightHourMax => TimeDelta::hours(8),
        }
    }
}
