//! Pairwise pollutant statistics: Pearson correlation and least-squares fits.
//!
//! All computations are pairwise-complete: a row contributes to a pair only
//! when both pollutant values are present.

use tracing::debug;

use crate::models::{CorrelationMatrix, Pollutant, Reading, RegressionStats};

/// Pearson correlation matrix over the given pollutants.
///
/// Cells stay `None` where fewer than two complete pairs exist or where a
/// column has zero variance.
pub fn correlation_matrix(readings: &[Reading], pollutants: &[Pollutant]) -> CorrelationMatrix {
    let coefficients: Vec<Vec<Option<f64>>> = pollutants
        .iter()
        .map(|&row| {
            pollutants
                .iter()
                .map(|&col| {
                    let pairs = complete_pairs(readings, row, col);
                    pearson(&pairs)
                })
                .collect()
        })
        .collect();

    debug!(
        "Correlation matrix over {} pollutants from {} readings",
        pollutants.len(),
        readings.len()
    );
    CorrelationMatrix {
        pollutants: pollutants.to_vec(),
        coefficients,
    }
}

/// Least-squares fit of `y` against `x`; `None` with fewer than two
/// complete pairs or a degenerate `x`.
pub fn regression_stats(
    readings: &[Reading],
    x: Pollutant,
    y: Pollutant,
) -> Option<RegressionStats> {
    let pairs = complete_pairs(readings, x, y);
    let n = pairs.len();
    if n < 2 {
        return None;
    }

    let nf = n as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / nf;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / nf;
    let ss_xx: f64 = pairs.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    let ss_xy: f64 = pairs
        .iter()
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();

    if ss_xx == 0.0 {
        return None;
    }

    let slope = ss_xy / ss_xx;
    let intercept = mean_y - slope * mean_x;
    let r_squared = pearson(&pairs).map(|r| r * r).unwrap_or(0.0);

    Some(RegressionStats {
        slope,
        intercept,
        r_squared,
        sample_count: n,
    })
}

fn complete_pairs(readings: &[Reading], a: Pollutant, b: Pollutant) -> Vec<(f64, f64)> {
    readings
        .iter()
        .filter_map(|r| match (r.pollutant(a), r.pollutant(b)) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((x, y)),
            _ => None,
        })
        .collect()
}

fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    let n = pairs.len();
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / nf;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / nf;

    let mut ss_xx = 0.0;
    let mut ss_yy = 0.0;
    let mut ss_xy = 0.0;
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        ss_xx += dx * dx;
        ss_yy += dy * dy;
        ss_xy += dx * dy;
    }

    if ss_xx == 0.0 || ss_yy == 0.0 {
        return None;
    }
    Some(ss_xy / (ss_xx * ss_yy).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aqi::{classify_risk, compute_aqi};
    use chrono::NaiveDateTime;

    fn reading(pm25: f64, pm10: Option<f64>, no2: Option<f64>) -> Reading {
        let timestamp =
            NaiveDateTime::parse_from_str("2024-01-01 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let aqi = compute_aqi(pm25).unwrap();
        Reading {
            city: "Delhi".to_string(),
            timestamp,
            pm25,
            pm10,
            no2,
            so2: None,
            co: None,
            latitude: None,
            longitude: None,
            aqi,
            risk: classify_risk(aqi).unwrap(),
        }
    }

    #[test]
    fn test_perfect_positive_correlation() {
        let readings: Vec<Reading> = (1..=5)
            .map(|i| reading(i as f64, Some(2.0 * i as f64), None))
            .collect();
        let matrix = correlation_matrix(&readings, &[Pollutant::Pm25, Pollutant::Pm10]);
        let r = matrix.coefficients[0][1].unwrap();
        assert!((r - 1.0).abs() < 1e-9);
        // Diagonal correlates a column with itself.
        assert!((matrix.coefficients[0][0].unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_perfect_negative_correlation() {
        let readings: Vec<Reading> = (1..=5)
            .map(|i| reading(i as f64, Some(100.0 - i as f64), None))
            .collect();
        let matrix = correlation_matrix(&readings, &[Pollutant::Pm25, Pollutant::Pm10]);
        let r = matrix.coefficients[0][1].unwrap();
        assert!((r + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_values_are_pairwise_dropped() {
        let readings = vec![
            reading(1.0, Some(2.0), None),
            reading(2.0, None, None),
            reading(3.0, Some(6.0), None),
        ];
        let matrix = correlation_matrix(&readings, &[Pollutant::Pm25, Pollutant::Pm10]);
        // Only two complete pairs remain, still enough for a coefficient.
        assert!(matrix.coefficients[0][1].is_some());
        // NO2 has no values at all.
        let with_no2 =
            correlation_matrix(&readings, &[Pollutant::Pm25, Pollutant::No2]);
        assert!(with_no2.coefficients[0][1].is_none());
    }

    #[test]
    fn test_zero_variance_yields_none() {
        let readings = vec![
            reading(1.0, Some(5.0), None),
            reading(2.0, Some(5.0), None),
            reading(3.0, Some(5.0), None),
        ];
        let matrix = correlation_matrix(&readings, &[Pollutant::Pm25, Pollutant::Pm10]);
        assert!(matrix.coefficients[0][1].is_none());
    }

    #[test]
    fn test_regression_recovers_line() {
        // pm10 = 3 * pm25 + 1, exactly.
        let readings: Vec<Reading> = (1..=10)
            .map(|i| reading(i as f64, Some(3.0 * i as f64 + 1.0), None))
            .collect();
        let stats = regression_stats(&readings, Pollutant::Pm25, Pollutant::Pm10).unwrap();
        assert!((stats.slope - 3.0).abs() < 1e-9);
        assert!((stats.intercept - 1.0).abs() < 1e-9);
        assert!((stats.r_squared - 1.0).abs() < 1e-9);
        assert_eq!(stats.sample_count, 10);
    }

    #[test]
    fn test_regression_needs_two_points() {
        let readings = vec![reading(1.0, Some(2.0), None)];
        assert!(regression_stats(&readings, Pollutant::Pm25, Pollutant::Pm10).is_none());
    }
}
