//! Daily Report Example for the AQI Scoring Engine
//!
//! This example feeds two days of synthetic hourly samples through the engine, prints the
//! daily records and the tail of the trailing trend, and builds forecasting features.
//!
//! Run with: cargo run --example daily_report

use aqi_scoring::{
    AqiError, Concentrations, Engine, EngineConfig, MemoryStore, PollutantKind, RawSample,
    Weather, lag_features,
};
use chrono::{DateTime, TimeDelta};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("AQI Scoring Engine - Daily Report Example\n");

    let start = DateTime::parse_from_rfc3339("2026-10-17T00:00:00+05:30")?;
    let now = start + TimeDelta::hours(47);

    let mut batch: Vec<RawSample> = (0..48)
        .map(|hour: i32| {
            // evening traffic peak
            let rush = if (17..21).contains(&(hour % 24)) { 2.0 } else { 1.0 };
            let h = f64::from(hour);
            RawSample {
                timestamp: Some((start + TimeDelta::hours(hour.into())).to_rfc3339()),
                concentrations: Concentrations::from([
                    (PollutantKind::Pm25, 35.0 * rush + h * 0.2),
                    (PollutantKind::Pm10, 90.0 * rush),
                    (PollutantKind::No2, 30.0 * rush),
                    (PollutantKind::So2, 8.0),
                    (PollutantKind::Co, 0.9 * rush),
                    (PollutantKind::O3, 40.0 + h),
                ]),
                weather: Weather {
                    temperature_c: Some(24.0),
                    humidity_pct: Some(60.0),
                    uv_index: Some(6.0),
                    ..Weather::default()
                },
                reported_aqi: None,
            }
        })
        .collect();
    batch.push(RawSample {
        timestamp: Some("yesterday".into()),
        ..RawSample::default()
    });

    let mut engine = Engine::new(&EngineConfig::default(), MemoryStore::default())?;
    let summary = engine.run(batch, now)?;

    println!("📥 Ingestion");
    println!("============");
    println!("Retained samples: {}", summary.series.len());
    for rejected in &summary.rejected {
        println!("❌ Dropped: {rejected}");
    }
    println!();

    println!("📅 Daily records");
    println!("================");
    for day in &summary.daily {
        println!(
            "{} {} ({})",
            day.date,
            day.record,
            day.record.category().hex_color()
        );
    }
    println!();

    println!("📈 Trend (last 4 hours)");
    println!("=======================");
    for point in summary.trend.iter().rev().take(4).rev() {
        println!("{} {}", point.timestamp.format("%Y-%m-%d %H:%M"), point.record);
    }
    println!();

    let features = lag_features(&summary.trend);
    println!("🔧 Feature rows: {}", features.len());
    if let Some(row) = features.last() {
        println!(
            "Last row: hour={} lags=({}, {}, {}) target={}",
            row.hour, row.aqi_lag1, row.aqi_lag2, row.aqi_lag3, row.target_aqi
        );
    }
    println!();

    println!("⚠️  Error handling");
    println!("=================");
    match EngineConfig::from_json_str(r#"{"retention_days": 0}"#) {
        Ok(_) => println!("Unexpectedly accepted"),
        Err(AqiError::Configuration(msg)) => println!("Configuration rejected: {msg}"),
        Err(e) => println!("Other error: {e}"),
    }

    Ok(())
}
