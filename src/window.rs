//! Regulatory time-window aggregation
//!
//! Windows are defined by elapsed time, not by sample count: a trailing window of length
//! `w` evaluated at `t` covers `(t - w, t]`. Calendar dates are taken in each sample's own
//! UTC offset. Samples that lack a pollutant do not contribute to its windows, and a window
//! without any contributing sample yields no value.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::pollutant::{Averaging, Concentrations, PollutantKind};
use crate::sample::SampleSeries;

/// Windowed value of one pollutant at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowedPoint {
    pub timestamp: DateTime<FixedOffset>,
    pub value: f64,
}

/// Trailing arithmetic mean over the preceding `window`, evaluated at every sample timestamp
///
/// `series` must be sorted ascending, as produced by the reconciler. Samples sharing a
/// timestamp are taken positionally: the window at a sample ends at that sample.
#[must_use]
pub fn rolling_mean(
    series: &SampleSeries,
    pollutant: PollutantKind,
    window: TimeDelta,
) -> Vec<WindowedPoint> {
    series
        .iter()
        .zip(rolling_means(series, pollutant, window))
        .filter_map(|(sample, mean)| {
            mean.map(|value| WindowedPoint {
                timestamp: sample.timestamp,
                value,
            })
        })
        .collect()
}

/// One entry per sample: the trailing mean ending at that sample, if the window is not empty
fn rolling_means(
    series: &SampleSeries,
    pollutant: PollutantKind,
    window: TimeDelta,
) -> Vec<Option<f64>> {
    let mut means = Vec::with_capacity(series.len());
    let mut open: VecDeque<(DateTime<FixedOffset>, f64)> = VecDeque::new();
    let mut sum = 0.0;

    for sample in series {
        if let Some(value) = sample.concentration(pollutant) {
            open.push_back((sample.timestamp, value));
            sum += value;
        }

        let start = sample.timestamp - window;
        while let Some(&(timestamp, value)) = open.front() {
            if timestamp > start {
                break;
            }
            sum -= value;
            open.pop_front();
        }

        if open.is_empty() {
            // drop accumulated rounding error whenever the window drains
            sum = 0.0;
            means.push(None);
        } else {
            #[allow(clippy::cast_precision_loss)]
            let mean = sum / open.len() as f64;
            means.push(Some(mean));
        }
    }

    means
}

/// Mean of all samples of each calendar date
#[must_use]
pub fn daily_mean_by_calendar_date(
    series: &SampleSeries,
    pollutant: PollutantKind,
) -> BTreeMap<NaiveDate, f64> {
    let mut buckets: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();
    for sample in series {
        if let Some(value) = sample.concentration(pollutant) {
            let bucket = buckets.entry(sample.timestamp.date_naive()).or_default();
            bucket.0 += value;
            bucket.1 += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(date, (sum, count))| (date, sum / f64::from(count)))
        .collect()
}

/// Maximum, per calendar date, of the trailing `window` rolling mean
///
/// This is the worst-case exposure over the day, not the day's average: a short spike
/// raises the rolling mean of the hours around it even when the daily mean stays low.
#[must_use]
pub fn daily_max_of_rolling_mean(
    series: &SampleSeries,
    pollutant: PollutantKind,
    window: TimeDelta,
) -> BTreeMap<NaiveDate, f64> {
    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for point in rolling_mean(series, pollutant, window) {
        daily
            .entry(point.timestamp.date_naive())
            .and_modify(|current| *current = current.max(point.value))
            .or_insert(point.value);
    }
    daily
}

/// Daily value of `pollutant` under its regulatory averaging class
#[must_use]
pub fn daily_by_averaging(
    series: &SampleSeries,
    pollutant: PollutantKind,
) -> BTreeMap<NaiveDate, f64> {
    match pollutant.averaging() {
        Averaging::TwentyFourHourMean => daily_mean_by_calendar_date(series, pollutant),
        averaging @ Averaging::EightHourMax => {
            daily_max_of_rolling_mean(series, pollutant, averaging.window())
        }
    }
}

fn daily_class(series: &SampleSeries, class: Averaging) -> BTreeMap<NaiveDate, Concentrations> {
    let mut by_date: BTreeMap<NaiveDate, Concentrations> = BTreeMap::new();
    for pollutant in PollutantKind::ALL
        .into_iter()
        .filter(|p| p.averaging() == class)
    {
        for (date, value) in daily_by_averaging(series, pollutant) {
            by_date.entry(date).or_default().insert(pollutant, value);
        }
    }
    by_date
}

/// Daily windowed concentrations of every pollutant, one entry per calendar date
///
/// The 24-hour class and the 8-hour class are inner-joined on date: a date that only one
/// class has data for is left out rather than scored as a complete day.
#[must_use]
pub fn daily_windowed(series: &SampleSeries) -> BTreeMap<NaiveDate, Concentrations> {
    let mut long = daily_class(series, Averaging::TwentyFourHourMean);
    let short = daily_class(series, Averaging::EightHourMax);

    short
        .into_iter()
        .filter_map(|(date, mut row)| {
            let mut joined = long.remove(&date)?;
            joined.append(&mut row);
            Some((date, joined))
        })
        .collect()
}

/// The "today" row: the latest date of the 24-hour class joined with the latest date of
/// the 8-hour class
///
/// When the two classes disagree on their latest date nothing is returned, so a day that
/// one class has stopped reporting for never stands in for today.
#[must_use]
pub fn latest_daily(series: &SampleSeries) -> Option<(NaiveDate, Concentrations)> {
    let (long_date, mut joined) = daily_class(series, Averaging::TwentyFourHourMean).pop_last()?;
    let (short_date, mut short) = daily_class(series, Averaging::EightHourMax).pop_last()?;
    if long_date != short_date {
        return None;
    }
    joined.append(&mut short);
    Some((long_date, joined))
}

/// Continuously trailing windowed concentrations at every sample timestamp
///
/// Each pollutant uses the trailing mean over its own averaging window (24 h or 8 h).
/// Timestamps where no pollutant has a value are left out.
#[must_use]
pub fn trailing_windowed(series: &SampleSeries) -> Vec<(DateTime<FixedOffset>, Concentrations)> {
    series
        .iter()
        .zip(trailing_rows(series))
        .filter(|(_, row)| !row.is_empty())
        .map(|(sample, row)| (sample.timestamp, row))
        .collect()
}

/// One row per sample, empty where no pollutant has a value in its window
pub(crate) fn trailing_rows(series: &SampleSeries) -> Vec<Concentrations> {
    let columns: Vec<(PollutantKind, Vec<Option<f64>>)> = PollutantKind::ALL
        .into_iter()
        .map(|p| (p, rolling_means(series, p, p.averaging().window())))
        .collect();

    (0..series.len())
        .map(|index| {
            columns
                .iter()
                .filter_map(|(pollutant, means)| means[index].map(|value| (*pollutant, value)))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::air_quality::score;
    use crate::breakpoints::BreakpointTable;
    use crate::sample::Sample;

    const EPS: f64 = 1e-9;

    fn at(ts: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(ts).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    /// Samples every `step` starting at `start`, one per value
    fn regular(start: &str, step: TimeDelta, pollutant: PollutantKind, values: &[f64]) -> Vec<Sample> {
        let start = at(start);
        values
            .iter()
            .zip(0..)
            .map(|(value, i)| {
                Sample::new(start + step * i, Concentrations::from([(pollutant, *value)]))
            })
            .collect()
    }

    #[test]
    fn constant_series_rolls_to_constant() {
        let series = SampleSeries::from_unsorted(regular(
            "2026-10-17T00:00:00+05:30",
            TimeDelta::minutes(15),
            PollutantKind::Pm25,
            &[40.0; 96],
        ));

        let points = rolling_mean(&series, PollutantKind::Pm25, TimeDelta::hours(24));
        assert_eq!(points.len(), 96);
        assert!(points.iter().all(|p| (p.value - 40.0).abs() < EPS));

        let table = BreakpointTable::cpcb();
        for point in &points {
            let record = score(&Concentrations::from([(PollutantKind::Pm25, point.value)]), &table)
                .unwrap();
            assert_eq!(record.overall_index, 66);
        }
    }

    #[test]
    fn window_is_time_based_and_half_open() {
        // irregular spacing: 00:00, 00:10, 05:00, 08:00
        let samples = vec![
            Sample::new(at("2026-10-17T00:00:00Z"), Concentrations::from([(PollutantKind::Co, 1.0)])),
            Sample::new(at("2026-10-17T00:10:00Z"), Concentrations::from([(PollutantKind::Co, 3.0)])),
            Sample::new(at("2026-10-17T05:00:00Z"), Concentrations::from([(PollutantKind::Co, 5.0)])),
            Sample::new(at("2026-10-17T08:00:00Z"), Concentrations::from([(PollutantKind::Co, 7.0)])),
        ];
        let series = SampleSeries::from_unsorted(samples);
        let values: Vec<f64> = rolling_mean(&series, PollutantKind::Co, TimeDelta::hours(8))
            .iter()
            .map(|p| p.value)
            .collect();
        // at 08:00 the 00:00 sample sits exactly on the open edge and is excluded
        assert_eq!(values, vec![1.0, 2.0, 3.0, 5.0]);
    }

    #[test]
    fn missing_values_are_skipped_and_empty_windows_emit_nothing() {
        let samples = vec![
            Sample::new(at("2026-10-17T00:00:00Z"), Concentrations::from([(PollutantKind::O3, 10.0)])),
            Sample::new(at("2026-10-17T01:00:00Z"), Concentrations::from([(PollutantKind::Pm10, 99.0)])),
            Sample::new(at("2026-10-17T12:00:00Z"), Concentrations::from([(PollutantKind::Pm10, 99.0)])),
            Sample::new(at("2026-10-17T13:00:00Z"), Concentrations::from([(PollutantKind::O3, 30.0)])),
        ];
        let series = SampleSeries::from_unsorted(samples);
        let points = rolling_mean(&series, PollutantKind::O3, TimeDelta::hours(8));
        let got: Vec<_> = points.iter().map(|p| (p.timestamp, p.value)).collect();
        assert_eq!(
            got,
            vec![
                (at("2026-10-17T00:00:00Z"), 10.0),
                (at("2026-10-17T01:00:00Z"), 10.0),
                (at("2026-10-17T13:00:00Z"), 30.0),
            ]
        );
    }

    #[test]
    fn calendar_days_follow_sample_offset() {
        let samples = vec![
            // grouped by local date, not UTC date
            Sample::new(at("2026-10-16T23:30:00+05:30"), Concentrations::from([(PollutantKind::No2, 10.0)])),
            Sample::new(at("2026-10-17T00:30:00+05:30"), Concentrations::from([(PollutantKind::No2, 20.0)])),
            Sample::new(at("2026-10-17T12:00:00+05:30"), Concentrations::from([(PollutantKind::No2, 40.0)])),
        ];
        let series = SampleSeries::from_unsorted(samples);
        let daily = daily_mean_by_calendar_date(&series, PollutantKind::No2);
        assert_eq!(
            daily,
            BTreeMap::from([(date("2026-10-16"), 10.0), (date("2026-10-17"), 30.0)])
        );
    }

    #[test]
    fn rolling_max_captures_spike_that_daily_mean_dilutes() {
        // 15-minute CO samples for one day at 1.0 mg/m³ with a two-hour spike at 20.0
        let values: Vec<f64> = (0..96)
            .map(|i| if (40..48).contains(&i) { 20.0 } else { 1.0 })
            .collect();
        let series = SampleSeries::from_unsorted(regular(
            "2026-10-17T00:00:00+05:30",
            TimeDelta::minutes(15),
            PollutantKind::Co,
            &values,
        ));

        let day = date("2026-10-17");
        let mean = daily_mean_by_calendar_date(&series, PollutantKind::Co)[&day];
        let worst = daily_max_of_rolling_mean(&series, PollutantKind::Co, TimeDelta::hours(8))[&day];

        assert!((mean - 248.0 / 96.0).abs() < EPS);
        assert!((worst - 5.75).abs() < EPS);

        // a breakpoint at 5.0 mg/m³ is crossed only by the rolling-then-max value
        let threshold = 5.0;
        assert!(mean < threshold);
        assert!(worst > threshold);
        assert_eq!(daily_by_averaging(&series, PollutantKind::Co)[&day], worst);
    }

    #[test]
    fn daily_rows_inner_join_on_date() {
        let mut samples = regular(
            "2026-10-16T00:00:00+05:30",
            TimeDelta::hours(6),
            PollutantKind::Pm25,
            &[30.0, 50.0, 70.0, 90.0, 10.0, 10.0, 10.0, 10.0],
        );
        // ozone only on the 17th
        samples.extend(regular(
            "2026-10-17T00:00:00+05:30",
            TimeDelta::hours(1),
            PollutantKind::O3,
            &[60.0; 4],
        ));
        let series = SampleSeries::from_unsorted(samples);

        let daily = daily_windowed(&series);
        assert_eq!(daily.len(), 1);
        let row = &daily[&date("2026-10-17")];
        assert_eq!(row[&PollutantKind::Pm25], 10.0);
        assert_eq!(row[&PollutantKind::O3], 60.0);

        let (latest, _) = latest_daily(&series).unwrap();
        assert_eq!(latest, date("2026-10-17"));
    }

    #[test]
    fn no_join_without_both_classes() {
        let series = SampleSeries::from_unsorted(regular(
            "2026-10-17T00:00:00+05:30",
            TimeDelta::hours(1),
            PollutantKind::Pm10,
            &[80.0; 24],
        ));
        assert!(daily_windowed(&series).is_empty());
        assert_eq!(latest_daily(&series), None);
    }

    #[test]
    fn latest_daily_requires_both_classes_on_the_same_latest_date() {
        let mut samples = regular(
            "2026-10-17T00:00:00+05:30",
            TimeDelta::hours(1),
            PollutantKind::Pm25,
            &[40.0; 48],
        );
        // CO stops reporting on the morning of the 17th
        samples.extend(regular(
            "2026-10-17T00:01:00+05:30",
            TimeDelta::hours(1),
            PollutantKind::Co,
            &[1.5; 10],
        ));
        let series = SampleSeries::from_unsorted(samples);

        // the 17th is still a complete joined day for the history
        assert_eq!(
            daily_windowed(&series).keys().copied().collect::<Vec<_>>(),
            vec![date("2026-10-17")]
        );
        assert_eq!(latest_daily(&series), None);
    }

    #[test]
    fn trailing_rows_use_each_pollutant_window() {
        let samples: Vec<Sample> = (0..12)
            .map(|hour| {
                Sample::new(
                    at("2026-10-17T00:00:00Z") + TimeDelta::hours(hour),
                    Concentrations::from([
                        (PollutantKind::Pm25, if hour < 6 { 10.0 } else { 40.0 }),
                        (PollutantKind::Co, if hour < 6 { 1.0 } else { 3.0 }),
                    ]),
                )
            })
            .collect();
        let series = SampleSeries::from_unsorted(samples);

        let rows = trailing_windowed(&series);
        assert_eq!(rows.len(), 12);
        let (timestamp, last) = &rows[11];
        assert_eq!(*timestamp, at("2026-10-17T11:00:00Z"));
        // 24 h window still holds all twelve hours, 8 h window only 04:00..11:00
        assert!((last[&PollutantKind::Pm25] - 25.0).abs() < EPS);
        assert!((last[&PollutantKind::Co] - 2.5).abs() < EPS);
    }

    #[test]
    fn trailing_rows_skip_pollutants_without_window_data() {
        let samples = vec![
            Sample::new(at("2026-10-17T00:00:00Z"), Concentrations::from([(PollutantKind::Co, 2.0)])),
            Sample::new(at("2026-10-17T10:00:00Z"), Concentrations::from([(PollutantKind::Pm10, 50.0)])),
        ];
        let series = SampleSeries::from_unsorted(samples);
        let rows = trailing_windowed(&series);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].1, Concentrations::from([(PollutantKind::Co, 2.0)]));
        // CO left the 8 h window by 10:00
        assert_eq!(rows[1].1, Concentrations::from([(PollutantKind::Pm10, 50.0)]));
    }
}
