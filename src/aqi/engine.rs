//! Converts PM2.5 concentrations to AQI values and classifies them.
//!
//! The EPA-style breakpoint table lives here as a static ordered array and
//! is scanned linearly; with six rows a binary search buys nothing.

use crate::error::{AppError, Result};
use crate::models::RiskCategory;

/// One concentration interval mapped onto an AQI sub-range.
#[derive(Debug, Clone, Copy)]
struct Breakpoint {
    pm25_low: f64,
    pm25_high: f64,
    aqi_low: f64,
    aqi_high: f64,
}

/// EPA PM2.5 breakpoints. Concentrations strictly between two rows (the
/// published table leaves 12.0..12.1 uncovered) match nothing and saturate
/// to [`AQI_CEILING`], the same as values beyond the last row.
const BREAKPOINTS: [Breakpoint; 6] = [
    Breakpoint { pm25_low: 0.0, pm25_high: 12.0, aqi_low: 0.0, aqi_high: 50.0 },
    Breakpoint { pm25_low: 12.1, pm25_high: 35.4, aqi_low: 51.0, aqi_high: 100.0 },
    Breakpoint { pm25_low: 35.5, pm25_high: 55.4, aqi_low: 101.0, aqi_high: 150.0 },
    Breakpoint { pm25_low: 55.5, pm25_high: 150.4, aqi_low: 151.0, aqi_high: 200.0 },
    Breakpoint { pm25_low: 150.5, pm25_high: 250.4, aqi_low: 201.0, aqi_high: 300.0 },
    Breakpoint { pm25_low: 250.5, pm25_high: 500.4, aqi_low: 301.0, aqi_high: 500.0 },
];

/// AQI value reported for concentrations not covered by any breakpoint row.
const AQI_CEILING: f64 = 500.0;

/// Computes the AQI for a PM2.5 concentration in µg/m³.
///
/// Linear interpolation within the matching breakpoint row; unmatched
/// concentrations saturate to 500 instead of failing.
///
/// # Errors
///
/// Returns [`AppError::InvalidMeasurement`] for negative or non-finite
/// input. The loader drops such rows before they reach this function.
pub fn compute_aqi(pm25: f64) -> Result<f64> {
    if !pm25.is_finite() || pm25 < 0.0 {
        return Err(AppError::InvalidMeasurement(pm25));
    }

    for bp in &BREAKPOINTS {
        if bp.pm25_low <= pm25 && pm25 <= bp.pm25_high {
            let aqi = (bp.aqi_high - bp.aqi_low) / (bp.pm25_high - bp.pm25_low)
                * (pm25 - bp.pm25_low)
                + bp.aqi_low;
            return Ok(aqi);
        }
    }

    Ok(AQI_CEILING)
}

/// Classifies an AQI value into its health-risk category.
///
/// Bands are right-inclusive: `[0,50]` Good, `(50,100]` Moderate,
/// `(100,150]` Unhealthy for Sensitive Groups, `(150,200]` Unhealthy,
/// `(200,300]` Very Unhealthy; everything above 300 is Hazardous, so the
/// classification is total for finite non-negative input.
///
/// # Errors
///
/// Returns [`AppError::InvalidMeasurement`] for negative or non-finite input.
pub fn classify_risk(aqi: f64) -> Result<RiskCategory> {
    if !aqi.is_finite() || aqi < 0.0 {
        return Err(AppError::InvalidMeasurement(aqi));
    }

    let category = if aqi <= 50.0 {
        RiskCategory::Good
    } else if aqi <= 100.0 {
        RiskCategory::Moderate
    } else if aqi <= 150.0 {
        RiskCategory::UnhealthySensitive
    } else if aqi <= 200.0 {
        RiskCategory::Unhealthy
    } else if aqi <= 300.0 {
        RiskCategory::VeryUnhealthy
    } else {
        RiskCategory::Hazardous
    };

    Ok(category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(12.0, 50.0)]
    #[case(12.1, 51.0)]
    #[case(35.4, 100.0)]
    #[case(35.5, 101.0)]
    #[case(55.4, 150.0)]
    #[case(55.5, 151.0)]
    #[case(150.4, 200.0)]
    #[case(150.5, 201.0)]
    #[case(250.4, 300.0)]
    #[case(250.5, 301.0)]
    #[case(500.4, 500.0)]
    fn test_aqi_exact_at_interval_boundaries(#[case] pm25: f64, #[case] expected: f64) {
        let aqi = compute_aqi(pm25).unwrap();
        assert!(
            (aqi - expected).abs() < 1e-9,
            "pm25 {} gave AQI {}, expected {}",
            pm25,
            aqi,
            expected
        );
    }

    #[test]
    fn test_aqi_interpolates_within_interval() {
        // 10 µg/m³ sits inside the first row: 50/12 * 10.
        let aqi = compute_aqi(10.0).unwrap();
        assert!((aqi - 41.666_666_666_7).abs() < 1e-6);

        // 25 µg/m³ sits inside the second row.
        let aqi = compute_aqi(25.0).unwrap();
        let expected = (100.0 - 51.0) / (35.4 - 12.1) * (25.0 - 12.1) + 51.0;
        assert!((aqi - expected).abs() < 1e-9);
    }

    #[test]
    fn test_aqi_monotonic_within_each_interval() {
        let intervals = [
            (0.0, 12.0),
            (12.1, 35.4),
            (35.5, 55.4),
            (55.5, 150.4),
            (150.5, 250.4),
            (250.5, 500.4),
        ];
        for (low, high) in intervals {
            let mut previous = f64::NEG_INFINITY;
            let steps = 50;
            for i in 0..=steps {
                let pm25 = low + (high - low) * (i as f64) / (steps as f64);
                let aqi = compute_aqi(pm25).unwrap();
                assert!(aqi >= previous, "AQI decreased at pm25 {}", pm25);
                previous = aqi;
            }
        }
    }

    #[test]
    fn test_aqi_saturates_above_table() {
        assert_eq!(compute_aqi(600.0).unwrap(), 500.0);
        assert_eq!(compute_aqi(1e6).unwrap(), 500.0);
    }

    #[test]
    fn test_aqi_saturates_in_table_gap() {
        // 12.05 falls between the first two rows and matches neither.
        assert_eq!(compute_aqi(12.05).unwrap(), 500.0);
    }

    #[rstest]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_aqi_rejects_invalid_input(#[case] pm25: f64) {
        assert!(matches!(
            compute_aqi(pm25),
            Err(AppError::InvalidMeasurement(_))
        ));
    }

    #[rstest]
    #[case(0.0, RiskCategory::Good)]
    #[case(50.0, RiskCategory::Good)]
    #[case(50.1, RiskCategory::Moderate)]
    #[case(100.0, RiskCategory::Moderate)]
    #[case(100.1, RiskCategory::UnhealthySensitive)]
    #[case(150.0, RiskCategory::UnhealthySensitive)]
    #[case(150.1, RiskCategory::Unhealthy)]
    #[case(200.0, RiskCategory::Unhealthy)]
    #[case(200.1, RiskCategory::VeryUnhealthy)]
    #[case(300.0, RiskCategory::VeryUnhealthy)]
    #[case(300.1, RiskCategory::Hazardous)]
    #[case(500.0, RiskCategory::Hazardous)]
    #[case(501.0, RiskCategory::Hazardous)]
    fn test_risk_bands_are_right_inclusive(#[case] aqi: f64, #[case] expected: RiskCategory) {
        assert_eq!(classify_risk(aqi).unwrap(), expected);
    }

    #[test]
    fn test_risk_bands_partition_without_gaps() {
        // Walking the scale in small steps must never skip a band or go backwards.
        let mut previous = RiskCategory::Good;
        let mut step_count = 0;
        let mut aqi = 0.0;
        while aqi <= 500.0 {
            let category = classify_risk(aqi).unwrap();
            assert!(
                category.severity_rank() as i16 - previous.severity_rank() as i16 <= 1,
                "band skipped near AQI {}",
                aqi
            );
            assert!(category >= previous, "severity regressed near AQI {}", aqi);
            previous = category;
            step_count += 1;
            aqi = step_count as f64 * 0.1;
        }
        assert_eq!(previous, RiskCategory::Hazardous);
    }

    #[test]
    fn test_classify_rejects_invalid_input() {
        assert!(matches!(
            classify_risk(-0.5),
            Err(AppError::InvalidMeasurement(_))
        ));
        assert!(matches!(
            classify_risk(f64::NAN),
            Err(AppError::InvalidMeasurement(_))
        ));
    }
}
