//! Loads and validates the source CSV, enriching every row with its AQI
//! and risk category.

use std::path::Path;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::aqi::{classify_risk, compute_aqi};
use crate::error::{AppError, Result};
use crate::models::{RawRecord, Reading};
use chrono::NaiveDateTime;

/// Columns the source file must carry. `Latitude`/`Longitude` are optional.
pub const REQUIRED_COLUMNS: [&str; 7] = ["PM2.5", "PM10", "NO2", "SO2", "CO", "City", "Timestamp"];

/// Timestamp layouts accepted for the `Timestamp` column. All parse to a
/// timezone-naive instant; offset-carrying strings have the offset stripped.
const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Reads, validates and enriches the source CSV.
///
/// The pipeline mirrors the load contract: verify required columns, drop
/// rows without a usable PM2.5 value, parse timestamps, derive AQI and risk
/// per row, and fail with a validation error when nothing survives.
///
/// # Errors
///
/// `AppError::DataValidation` for missing columns or an empty result,
/// `AppError::Csv`/`AppError::TimestampParse` for malformed content.
pub fn load_readings(path: &Path) -> Result<Vec<Reading>> {
    info!("Loading air quality data from {}", path.display());

    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|required| !headers.iter().any(|h| h == *required))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::DataValidation(format!(
            "Missing columns: {}",
            missing.join(", ")
        )));
    }

    let mut records: Vec<RawRecord> = Vec::new();
    for row in reader.deserialize() {
        let record: RawRecord = row?;
        records.push(record);
    }
    let total_rows = records.len();

    // Rows without a usable PM2.5 value never reach the AQI engine.
    let usable: Vec<RawRecord> = records
        .into_iter()
        .filter(|r| matches!(r.pm25, Some(v) if v.is_finite() && v >= 0.0))
        .collect();
    let dropped = total_rows - usable.len();
    if dropped > 0 {
        warn!(
            "Dropped {} of {} rows with missing or invalid PM2.5",
            dropped, total_rows
        );
    }

    // Enrich in parallel; any parse failure aborts the load.
    let readings: Vec<Reading> = usable
        .par_iter()
        .map(enrich_record)
        .collect::<Result<Vec<Reading>>>()?;

    if readings.is_empty() {
        return Err(AppError::DataValidation(
            "No valid data after preprocessing".to_string(),
        ));
    }

    info!("Loaded {} readings from {}", readings.len(), path.display());
    Ok(readings)
}

fn enrich_record(record: &RawRecord) -> Result<Reading> {
    let timestamp = parse_timestamp(&record.timestamp)?;
    // The filter above guarantees a present, finite, non-negative value.
    let pm25 = record
        .pm25
        .ok_or(AppError::InvalidMeasurement(f64::NAN))?;
    let aqi = compute_aqi(pm25)?;
    let risk = classify_risk(aqi)?;

    Ok(Reading {
        city: record.city.clone(),
        timestamp,
        pm25,
        pm10: record.pm10,
        no2: record.no2,
        so2: record.so2,
        co: record.co,
        latitude: record.latitude,
        longitude: record.longitude,
        aqi,
        risk,
    })
}

/// Parses a timestamp string into a timezone-naive instant.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();

    for format in TIMESTAMP_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }
    // Date-only values land at midnight.
    if let Ok(date) = chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight);
        }
    }
    // Offset-aware strings are accepted with the offset dropped.
    match chrono::DateTime::parse_from_rfc3339(trimmed) {
        Ok(parsed) => Ok(parsed.naive_local()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskCategory;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "City,Timestamp,PM2.5,PM10,NO2,SO2,CO,Latitude,Longitude";

    fn write_csv(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_load_enriches_rows() {
        let file = write_csv(&[
            "Delhi,2024-01-01 08:00:00,10.0,20.0,15.0,4.0,300.0,28.61,77.21",
            "Delhi,2024-01-01 09:00:00,25.0,40.0,18.0,5.0,350.0,28.61,77.21",
        ]);
        let readings = load_readings(file.path()).unwrap();
        assert_eq!(readings.len(), 2);
        assert!((readings[0].aqi - 41.666_666_666_7).abs() < 1e-6);
        assert_eq!(readings[0].risk, RiskCategory::Good);
        assert_eq!(readings[1].risk, RiskCategory::Moderate);
    }

    #[test]
    fn test_rows_without_pm25_are_dropped() {
        let file = write_csv(&[
            "Delhi,2024-01-01 08:00:00,10.0,20.0,15.0,4.0,300.0,28.61,77.21",
            "Delhi,2024-01-01 09:00:00,,40.0,18.0,5.0,350.0,28.61,77.21",
            "Delhi,2024-01-01 10:00:00,-3.0,40.0,18.0,5.0,350.0,28.61,77.21",
        ]);
        let readings = load_readings(file.path()).unwrap();
        assert_eq!(readings.len(), 1);
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "City,Timestamp,PM10,NO2,SO2,CO").unwrap();
        writeln!(file, "Delhi,2024-01-01 08:00:00,20.0,15.0,4.0,300.0").unwrap();
        let result = load_readings(file.path());
        match result {
            Err(AppError::DataValidation(msg)) => assert!(msg.contains("PM2.5")),
            other => panic!("expected DataValidation, got {:?}", other),
        }
    }

    #[test]
    fn test_all_rows_dropped_is_fatal() {
        let file = write_csv(&["Delhi,2024-01-01 08:00:00,,20.0,15.0,4.0,300.0,,"]);
        assert!(matches!(
            load_readings(file.path()),
            Err(AppError::DataValidation(_))
        ));
    }

    #[test]
    fn test_optional_coordinates() {
        let file = write_csv(&["Delhi,2024-01-01 08:00:00,10.0,20.0,15.0,4.0,300.0,,"]);
        let readings = load_readings(file.path()).unwrap();
        assert!(readings[0].latitude.is_none());
        assert!(readings[0].longitude.is_none());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-01-01 08:00:00").is_ok());
        assert!(parse_timestamp("2024-01-01T08:00:00").is_ok());
        assert!(parse_timestamp("2024-01-01 08:00").is_ok());
        let midnight = parse_timestamp("2024-01-01").unwrap();
        assert_eq!(midnight.to_string(), "2024-01-01 00:00:00");
        // Offset-aware input keeps the wall-clock time.
        let naive = parse_timestamp("2024-01-01T08:00:00+05:30").unwrap();
        assert_eq!(naive.to_string(), "2024-01-01 08:00:00");
        assert!(parse_timestamp("not a time").is_err());
    }

    #[test]
    fn test_unparseable_timestamp_is_fatal() {
        let file = write_csv(&["Delhi,yesterday,10.0,20.0,15.0,4.0,300.0,,"]);
        assert!(matches!(
            load_readings(file.path()),
            Err(AppError::TimestampParse(_))
        ));
    }
}
