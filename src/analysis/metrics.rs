//! Current-status metrics: latest reading per city, headline numbers,
//! ranking and high-risk alerts.

use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::{CitySnapshot, CurrentMetrics, Reading, SelectionStats};

/// AQI level above which a city is flagged in the alert list.
const ALERT_THRESHOLD: f64 = 150.0;

/// Latest reading per city, sorted by city name.
///
/// Ties on the timestamp keep the first row encountered, matching the
/// source file's row order.
pub fn latest_snapshot(readings: &[Reading]) -> Vec<CitySnapshot> {
    let mut latest: Vec<&Reading> = Vec::new();
    for r in readings {
        match latest.iter_mut().find(|l| l.city == r.city) {
            Some(slot) => {
                if r.timestamp > slot.timestamp {
                    *slot = r;
                }
            },
            None => latest.push(r),
        }
    }

    let mut snapshots: Vec<CitySnapshot> = latest
        .into_iter()
        .map(|r| CitySnapshot {
            city: r.city.clone(),
            timestamp: r.timestamp,
            aqi: r.aqi,
            risk: r.risk,
            latitude: r.latitude,
            longitude: r.longitude,
        })
        .collect();
    snapshots.sort_by(|a, b| a.city.cmp(&b.city));
    snapshots
}

/// Worst city, best city and mean AQI across the latest snapshots.
pub fn current_metrics(snapshots: &[CitySnapshot]) -> Result<CurrentMetrics> {
    let worst = snapshots
        .iter()
        .max_by(|a, b| a.aqi.total_cmp(&b.aqi))
        .ok_or_else(|| AppError::EmptyResult("no current metrics available".to_string()))?;
    let best = snapshots
        .iter()
        .min_by(|a, b| a.aqi.total_cmp(&b.aqi))
        .ok_or_else(|| AppError::EmptyResult("no current metrics available".to_string()))?;
    let mean_aqi = snapshots.iter().map(|s| s.aqi).sum::<f64>() / snapshots.len() as f64;

    debug!(
        "Current metrics: worst {} ({:.1}), best {} ({:.1}), mean {:.1}",
        worst.city, worst.aqi, best.city, best.aqi, mean_aqi
    );
    Ok(CurrentMetrics {
        worst: worst.clone(),
        best: best.clone(),
        mean_aqi,
    })
}

/// Snapshots ordered worst-first for the comparison table.
pub fn rank_cities(snapshots: &[CitySnapshot]) -> Vec<CitySnapshot> {
    let mut ranked = snapshots.to_vec();
    ranked.sort_by(|a, b| b.aqi.total_cmp(&a.aqi));
    ranked
}

/// Alert lines for cities whose latest AQI exceeds the alert threshold.
pub fn high_risk_alerts(snapshots: &[CitySnapshot]) -> Vec<String> {
    snapshots
        .iter()
        .filter(|s| s.aqi > ALERT_THRESHOLD)
        .map(|s| format!("{}: {} AQI level", s.city, s.risk))
        .collect()
}

/// AQI spread over an already-filtered selection.
pub fn selection_stats(readings: &[Reading]) -> Result<SelectionStats> {
    if readings.is_empty() {
        return Err(AppError::EmptyResult(
            "no readings in the current selection".to_string(),
        ));
    }
    let mean_aqi = readings.iter().map(|r| r.aqi).sum::<f64>() / readings.len() as f64;
    let min_aqi = readings.iter().map(|r| r.aqi).fold(f64::INFINITY, f64::min);
    let max_aqi = readings
        .iter()
        .map(|r| r.aqi)
        .fold(f64::NEG_INFINITY, f64::max);
    Ok(SelectionStats {
        count: readings.len(),
        mean_aqi,
        min_aqi,
        max_aqi,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aqi::{classify_risk, compute_aqi};
    use chrono::NaiveDateTime;

    fn reading(city: &str, timestamp: &str, pm25: f64) -> Reading {
        let timestamp =
            NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S").unwrap();
        let aqi = compute_aqi(pm25).unwrap();
        Reading {
            city: city.to_string(),
            timestamp,
            pm25,
            pm10: None,
            no2: None,
            so2: None,
            co: None,
            latitude: Some(28.6),
            longitude: Some(77.2),
            aqi,
            risk: classify_risk(aqi).unwrap(),
        }
    }

    fn sample() -> Vec<Reading> {
        vec![
            reading("Delhi", "2024-01-01 08:00:00", 180.0),
            reading("Delhi", "2024-01-02 08:00:00", 200.0),
            reading("Mumbai", "2024-01-02 09:00:00", 10.0),
            reading("Mumbai", "2024-01-01 09:00:00", 30.0),
        ]
    }

    #[test]
    fn test_latest_snapshot_picks_newest_per_city() {
        let snapshots = latest_snapshot(&sample());
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].city, "Delhi");
        assert_eq!(
            snapshots[0].timestamp.to_string(),
            "2024-01-02 08:00:00"
        );
        assert_eq!(snapshots[1].city, "Mumbai");
        assert!((snapshots[1].aqi - compute_aqi(10.0).unwrap()).abs() < 1e-9);
    }

    #[test]
    fn test_current_metrics_extremes() {
        let snapshots = latest_snapshot(&sample());
        let metrics = current_metrics(&snapshots).unwrap();
        assert_eq!(metrics.worst.city, "Delhi");
        assert_eq!(metrics.best.city, "Mumbai");
        let expected = (snapshots[0].aqi + snapshots[1].aqi) / 2.0;
        assert!((metrics.mean_aqi - expected).abs() < 1e-9);
    }

    #[test]
    fn test_current_metrics_empty_is_signalled() {
        assert!(matches!(
            current_metrics(&[]),
            Err(AppError::EmptyResult(_))
        ));
    }

    #[test]
    fn test_ranking_is_worst_first() {
        let snapshots = latest_snapshot(&sample());
        let ranked = rank_cities(&snapshots);
        assert_eq!(ranked[0].city, "Delhi");
        assert_eq!(ranked[1].city, "Mumbai");
    }

    #[test]
    fn test_alerts_only_above_threshold() {
        let snapshots = latest_snapshot(&sample());
        let alerts = high_risk_alerts(&snapshots);
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].starts_with("Delhi:"));
    }

    #[test]
    fn test_selection_stats() {
        let readings = sample();
        let stats = selection_stats(&readings).unwrap();
        assert_eq!(stats.count, 4);
        assert!(stats.min_aqi <= stats.mean_aqi && stats.mean_aqi <= stats.max_aqi);
    }
}
