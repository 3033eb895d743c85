//! Result types produced by the analysis queries.
//!
//! Every query allocates fresh instances of these; nothing here refers back
//! into the loaded dataset.

use chrono::{NaiveDate, NaiveDateTime, Weekday};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::models::{Pollutant, RiskCategory};

/// Recurring time groupings supported by cycle aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CycleGranularity {
    HourOfDay,
    DayOfWeek,
    Month,
}

impl fmt::Display for CycleGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CycleGranularity::HourOfDay => "hour of day",
            CycleGranularity::DayOfWeek => "day of week",
            CycleGranularity::Month => "month",
        };
        write!(f, "{}", name)
    }
}

/// A concrete bucket key under one of the cycle granularities.
///
/// Generic map containers do not know calendar order, so the ordering of
/// keys is defined here explicitly: hours 0-23, weekdays Monday through
/// Sunday, months January through December.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleKey {
    Hour(u32),
    Weekday(Weekday),
    Month(u32),
}

impl CycleKey {
    /// Position of this key within its cycle's calendar order.
    pub fn sort_index(self) -> u32 {
        match self {
            CycleKey::Hour(h) => h,
            CycleKey::Weekday(d) => d.num_days_from_monday(),
            CycleKey::Month(m) => m,
        }
    }

    /// Human-readable bucket label.
    pub fn label(self) -> String {
        match self {
            CycleKey::Hour(h) => format!("{:02}:00", h),
            CycleKey::Weekday(d) => weekday_name(d).to_string(),
            CycleKey::Month(m) => month_name(m).to_string(),
        }
    }
}

impl fmt::Display for CycleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for CycleKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Full weekday name in calendar order Monday through Sunday.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Full month name for a 1-based month number.
pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

/// AQI statistics for one `(city, cycle bucket)` group.
///
/// Groups with zero readings are simply absent from the output, never
/// present with a null metric.
#[derive(Debug, Clone, Serialize)]
pub struct CycleStat {
    pub city: String,
    pub key: CycleKey,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` for single-reading groups.
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

/// One day on the regularized daily grid.
///
/// Days with no readings stay on the grid with `None` statistics; the
/// rolling mean may still be defined there from trailing observed days.
#[derive(Debug, Clone, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub count: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Trailing rolling mean of the daily means, defined from the first
    /// observed day onwards (minimum one observed period).
    pub rolling: Option<f64>,
}

/// The gap-preserving daily AQI series for one city.
#[derive(Debug, Clone, Serialize)]
pub struct DailySeries {
    pub city: String,
    /// Rolling window size, in days, applied to this series.
    pub window_days: u32,
    pub points: Vec<DailyPoint>,
}

/// The most recent reading for one city, with its derived risk.
#[derive(Debug, Clone, Serialize)]
pub struct CitySnapshot {
    pub city: String,
    pub timestamp: NaiveDateTime,
    pub aqi: f64,
    pub risk: RiskCategory,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Headline numbers across the latest snapshot of every selected city.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentMetrics {
    pub worst: CitySnapshot,
    pub best: CitySnapshot,
    pub mean_aqi: f64,
}

/// AQI spread over the currently filtered selection.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SelectionStats {
    pub count: usize,
    pub mean_aqi: f64,
    pub min_aqi: f64,
    pub max_aqi: f64,
}

/// Pearson correlation matrix over a set of pollutants.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub pollutants: Vec<Pollutant>,
    /// Row-major coefficients; `None` where fewer than two complete pairs exist.
    pub coefficients: Vec<Vec<Option<f64>>>,
}

/// Least-squares fit of one pollutant against another.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RegressionStats {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Number of rows where both pollutants were present.
    pub sample_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_sort_index_starts_monday() {
        assert_eq!(CycleKey::Weekday(Weekday::Mon).sort_index(), 0);
        assert_eq!(CycleKey::Weekday(Weekday::Sun).sort_index(), 6);
    }

    #[test]
    fn test_cycle_key_labels() {
        assert_eq!(CycleKey::Hour(7).label(), "07:00");
        assert_eq!(CycleKey::Weekday(Weekday::Wed).label(), "Wednesday");
        assert_eq!(CycleKey::Month(12).label(), "December");
    }
}
