//! Calendar-aware AQI aggregation.
//!
//! Cycle aggregation groups readings onto recurring buckets (hour of day,
//! weekday, month) in explicit calendar order. The daily trend resamples
//! each city onto a regular one-day grid, keeping gap days, and smooths the
//! daily means with a trailing rolling average whose window adapts to the
//! span of the data under query.

use chrono::{Datelike, NaiveDate, Timelike};
use std::collections::HashMap;
use tracing::debug;

use crate::models::{CycleGranularity, CycleKey, CycleStat, DailyPoint, DailySeries, Reading};

/// Spans at least this many days get the wide smoothing window.
const LONG_SPAN_DAYS: i64 = 365;
/// Rolling window for year-plus spans.
const LONG_WINDOW_DAYS: u32 = 30;
/// Rolling window for shorter spans.
const SHORT_WINDOW_DAYS: u32 = 7;

/// Groups readings by `(city, cycle bucket)` and summarizes AQI per group.
///
/// Output is sorted by city, then by the bucket's calendar position, so a
/// day-of-week table always runs Monday through Sunday regardless of input
/// row order. Buckets with no readings for a city are absent.
pub fn aggregate_by_cycle(readings: &[Reading], granularity: CycleGranularity) -> Vec<CycleStat> {
    let mut groups: HashMap<(String, CycleKey), Vec<f64>> = HashMap::new();

    for r in readings {
        let key = match granularity {
            CycleGranularity::HourOfDay => CycleKey::Hour(r.timestamp.hour()),
            CycleGranularity::DayOfWeek => CycleKey::Weekday(r.timestamp.weekday()),
            CycleGranularity::Month => CycleKey::Month(r.timestamp.month()),
        };
        groups.entry((r.city.clone(), key)).or_default().push(r.aqi);
    }

    let mut stats: Vec<CycleStat> = groups
        .into_iter()
        .map(|((city, key), values)| summarize_group(city, key, &values))
        .collect();

    stats.sort_by(|a, b| {
        a.city
            .cmp(&b.city)
            .then(a.key.sort_index().cmp(&b.key.sort_index()))
    });

    debug!(
        "Cycle aggregation by {} produced {} groups from {} readings",
        granularity,
        stats.len(),
        readings.len()
    );
    stats
}

fn summarize_group(city: String, key: CycleKey, values: &[f64]) -> CycleStat {
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let std = if count > 1 {
        let variance =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        Some(variance.sqrt())
    } else {
        None
    };
    CycleStat {
        city,
        key,
        count,
        mean,
        std,
        min,
        max,
    }
}

/// Picks the rolling window for the readings currently under query:
/// 30 days when the span reaches a year, 7 days otherwise.
///
/// The span is taken from the filtered readings, not the full dataset, so
/// narrowing the date filter narrows the smoothing window with it.
pub fn select_window_days(readings: &[Reading]) -> u32 {
    let first = readings.iter().map(|r| r.timestamp).min();
    let last = readings.iter().map(|r| r.timestamp).max();
    match (first, last) {
        (Some(first), Some(last)) => {
            let span_days = (last - first).num_days();
            if span_days >= LONG_SPAN_DAYS {
                LONG_WINDOW_DAYS
            } else {
                SHORT_WINDOW_DAYS
            }
        },
        _ => SHORT_WINDOW_DAYS,
    }
}

/// Daily resampling with the adaptive rolling window applied.
pub fn daily_trend(readings: &[Reading]) -> Vec<DailySeries> {
    aggregate_daily_with_rolling(readings, select_window_days(readings))
}

/// For each city independently: resample onto a one-day grid spanning the
/// city's first to last reading date, compute daily count/mean/min/max of
/// AQI, then a trailing rolling mean of the daily means over `window_days`.
///
/// Grid days with no readings keep `None` statistics but stay on the grid.
/// The rolling mean uses however many observed daily means fall inside the
/// trailing window, so it is defined from the first observed day onwards.
pub fn aggregate_daily_with_rolling(readings: &[Reading], window_days: u32) -> Vec<DailySeries> {
    let window_days = window_days.max(1);

    let mut by_city: HashMap<String, Vec<&Reading>> = HashMap::new();
    for r in readings {
        by_city.entry(r.city.clone()).or_default().push(r);
    }

    let mut series: Vec<DailySeries> = by_city
        .into_iter()
        .map(|(city, rows)| build_daily_series(city, &rows, window_days))
        .collect();
    series.sort_by(|a, b| a.city.cmp(&b.city));

    debug!(
        "Daily resampling produced {} city series (window {} days)",
        series.len(),
        window_days
    );
    series
}

fn build_daily_series(city: String, rows: &[&Reading], window_days: u32) -> DailySeries {
    let mut daily: HashMap<NaiveDate, Vec<f64>> = HashMap::new();
    for r in rows {
        daily.entry(r.timestamp.date()).or_default().push(r.aqi);
    }

    // rows is never empty: the city key only exists because a reading put it there.
    let first = rows.iter().map(|r| r.timestamp.date()).min().unwrap_or_default();
    let last = rows.iter().map(|r| r.timestamp.date()).max().unwrap_or_default();

    let mut points = Vec::new();
    let mut date = first;
    loop {
        let point = match daily.get(&date) {
            Some(values) => {
                let count = values.len();
                let mean = values.iter().sum::<f64>() / count as f64;
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                DailyPoint {
                    date,
                    count,
                    mean: Some(mean),
                    min: Some(min),
                    max: Some(max),
                    rolling: None,
                }
            },
            None => DailyPoint {
                date,
                count: 0,
                mean: None,
                min: None,
                max: None,
                rolling: None,
            },
        };
        points.push(point);

        if date >= last {
            break;
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }

    let rolling: Vec<Option<f64>> = (0..points.len())
        .map(|i| {
            let start = i.saturating_sub(window_days as usize - 1);
            let observed: Vec<f64> = points[start..=i].iter().filter_map(|p| p.mean).collect();
            if observed.is_empty() {
                None
            } else {
                Some(observed.iter().sum::<f64>() / observed.len() as f64)
            }
        })
        .collect();
    for (point, value) in points.iter_mut().zip(rolling) {
        point.rolling = value;
    }

    DailySeries {
        city,
        window_days,
        points,
    }
}
