//! Sample types: raw provider records, validated samples and the ordered series

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::{AqiError, Result};
use crate::pollutant::{Concentrations, PollutantKind};

/// Weather readings delivered alongside the pollutant concentrations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weather {
    /// Air temperature in Celsius
    pub temperature_c: Option<f64>,
    /// Relative humidity in %
    pub humidity_pct: Option<f64>,
    /// UV index
    pub uv_index: Option<f64>,
    /// Wind speed in km/h
    pub wind_kph: Option<f64>,
    /// Wind direction in degrees
    pub wind_degree: Option<f64>,
}

impl Weather {
    #[must_use]
    pub fn uv_band(&self) -> Option<UvBand> {
        self.uv_index.map(UvBand::from_index)
    }
}

/// Exposure band of a UV index reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UvBand {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl UvBand {
    #[must_use]
    pub fn from_index(uv: f64) -> Self {
        if uv > 11.0 {
            Self::Extreme
        } else if uv > 8.0 {
            Self::VeryHigh
        } else if uv > 6.0 {
            Self::High
        } else if uv > 3.0 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
            Self::Extreme => "Extreme",
        }
    }
}

/// A record as handed over by the sample provider, before validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// RFC 3339 timestamp with offset
    pub timestamp: Option<String>,
    #[serde(default)]
    pub concentrations: Concentrations,
    #[serde(default)]
    pub weather: Weather,
    /// Index published by a third party for the same instant, if any
    #[serde(default)]
    pub reported_aqi: Option<u32>,
}

/// One observation at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<FixedOffset>,
    pub concentrations: Concentrations,
    #[serde(default)]
    pub weather: Weather,
    #[serde(default)]
    pub reported_aqi: Option<u32>,
}

impl Sample {
    #[must_use]
    pub fn new(timestamp: DateTime<FixedOffset>, concentrations: Concentrations) -> Self {
        Self {
            timestamp,
            concentrations,
            weather: Weather::default(),
            reported_aqi: None,
        }
    }

    #[must_use]
    pub fn concentration(&self, pollutant: PollutantKind) -> Option<f64> {
        self.concentrations.get(&pollutant).copied()
    }

    /// Composite identity used for deduplication: the instant plus every scored value
    #[must_use]
    pub fn identity(&self) -> SampleIdentity {
        SampleIdentity {
            timestamp: self.timestamp,
            concentrations: self
                .concentrations
                .iter()
                // -0.0 and 0.0 are the same reading
                .map(|(pollutant, value)| (*pollutant, (value + 0.0).to_bits()))
                .collect(),
        }
    }
}

impl TryFrom<RawSample> for Sample {
    type Error = AqiError;

    fn try_from(raw: RawSample) -> Result<Self> {
        let timestamp = raw
            .timestamp
            .as_deref()
            .map(str::trim)
            .ok_or_else(|| AqiError::malformed_timestamp(None))
            .and_then(|value| {
                DateTime::parse_from_rfc3339(value)
                    .map_err(|_| AqiError::malformed_timestamp(Some(value)))
            })?;

        if let Some((pollutant, value)) = raw.concentrations.iter().find(|(_, v)| !v.is_finite()) {
            return Err(AqiError::MalformedSample(format!(
                "Non-finite {pollutant} concentration {value} at {timestamp}"
            )));
        }

        Ok(Self {
            timestamp,
            concentrations: raw.concentrations,
            weather: raw.weather,
            reported_aqi: raw.reported_aqi,
        })
    }
}

/// Deduplication key of a sample
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleIdentity {
    timestamp: DateTime<FixedOffset>,
    concentrations: Vec<(PollutantKind, u64)>,
}

/// Samples ordered by timestamp, as produced by the reconciler
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleSeries {
    samples: Vec<Sample>,
}

impl SampleSeries {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from samples in any order; equal timestamps keep their relative order
    #[must_use]
    pub fn from_unsorted(mut samples: Vec<Sample>) -> Self {
        samples.sort_by_key(|sample| sample.timestamp);
        Self { samples }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    #[must_use]
    pub fn latest(&self) -> Option<&Sample> {
        self.samples.last()
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<Sample> {
        self.samples
    }
}

impl<'a> IntoIterator for &'a SampleSeries {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
