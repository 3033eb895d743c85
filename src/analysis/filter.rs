//! City and date-range filtering plus the distinct-value helpers the CLI
//! uses to populate its selection prompts.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::Reading;

/// An inclusive calendar date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(AppError::Cli(format!(
                "Invalid date range: {} is after {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Restricts readings to the given cities and date window.
///
/// `None` for either filter means "no restriction". A selection that
/// matches nothing returns [`AppError::EmptyResult`] so the caller can
/// report it; it is never a panic.
pub fn filter_readings(
    readings: &[Reading],
    cities: Option<&[String]>,
    range: Option<DateRange>,
) -> Result<Vec<Reading>> {
    let filtered: Vec<Reading> = readings
        .iter()
        .filter(|r| match cities {
            Some(list) => list.iter().any(|c| c == &r.city),
            None => true,
        })
        .filter(|r| match range {
            Some(range) => range.contains(r.timestamp.date()),
            None => true,
        })
        .cloned()
        .collect();

    if filtered.is_empty() {
        let description = match (cities, range) {
            (Some(list), Some(range)) => {
                format!("cities {:?} between {} and {}", list, range.start, range.end)
            },
            (Some(list), None) => format!("cities {:?}", list),
            (None, Some(range)) => format!("between {} and {}", range.start, range.end),
            (None, None) => "empty dataset".to_string(),
        };
        debug!("Filter matched no readings: {}", description);
        return Err(AppError::EmptyResult(description));
    }

    debug!(
        "Filter kept {} of {} readings",
        filtered.len(),
        readings.len()
    );
    Ok(filtered)
}

/// Distinct city names, sorted, for selection prompts.
pub fn distinct_cities(readings: &[Reading]) -> Vec<String> {
    let mut cities: Vec<String> = readings.iter().map(|r| r.city.clone()).collect();
    cities.sort();
    cities.dedup();
    cities
}

/// First and last calendar date present in the dataset.
pub fn date_bounds(readings: &[Reading]) -> Option<(NaiveDate, NaiveDate)> {
    let first = readings.iter().map(|r| r.timestamp.date()).min()?;
    let last = readings.iter().map(|r| r.timestamp.date()).max()?;
    Some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskCategory;
    use chrono::NaiveDateTime;

    fn reading(city: &str, timestamp: &str, pm25: f64) -> Reading {
        let timestamp =
            NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S").unwrap();
        Reading {
            city: city.to_string(),
            timestamp,
            pm25,
            pm10: None,
            no2: None,
            so2: None,
            co: None,
            latitude: None,
            longitude: None,
            aqi: crate::aqi::compute_aqi(pm25).unwrap(),
            risk: RiskCategory::Good,
        }
    }

    fn sample() -> Vec<Reading> {
        vec![
            reading("Delhi", "2024-01-01 08:00:00", 10.0),
            reading("Delhi", "2024-01-05 08:00:00", 11.0),
            reading("Mumbai", "2024-01-03 08:00:00", 9.0),
        ]
    }

    #[test]
    fn test_filter_by_city() {
        let readings = sample();
        let filtered =
            filter_readings(&readings, Some(&["Delhi".to_string()]), None).unwrap();
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| r.city == "Delhi"));
    }

    #[test]
    fn test_filter_by_date_range() {
        let readings = sample();
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
        )
        .unwrap();
        let filtered = filter_readings(&readings, None, Some(range)).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].city, "Mumbai");
    }

    #[test]
    fn test_filter_empty_selection_is_signalled() {
        let readings = sample();
        let result = filter_readings(&readings, Some(&["Chennai".to_string()]), None);
        assert!(matches!(result, Err(AppError::EmptyResult(_))));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(DateRange::new(start, end).is_err());
    }

    #[test]
    fn test_distinct_cities_sorted() {
        let readings = sample();
        assert_eq!(distinct_cities(&readings), vec!["Delhi", "Mumbai"]);
    }

    #[test]
    fn test_date_bounds() {
        let readings = sample();
        let (first, last) = date_bounds(&readings).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    }
}
