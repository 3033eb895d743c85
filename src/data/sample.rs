//! Generates plausible sample readings when no source CSV is available.
//!
//! This is the fallback data source: the CLI warns and serves generated
//! data instead of failing outright, which also gives tests consistent,
//! controllable input without a data file on disk.

use chrono::{Duration, NaiveDateTime};
use rand::{thread_rng, Rng};
use tracing::debug;

use crate::aqi::{classify_risk, compute_aqi};
use crate::error::Result;
use crate::models::Reading;

/// Hours between consecutive generated readings per city.
const STEP_HOURS: i64 = 3;

/// Generates sample air quality readings for a fixed set of cities.
pub struct SampleDataProvider {
    cities: Vec<(String, (f64, f64))>,
}

impl SampleDataProvider {
    /// Creates a provider seeded with a default set of cities and coordinates.
    pub fn new() -> Self {
        debug!("Creating SampleDataProvider");
        Self {
            cities: vec![
                ("Delhi".to_string(), (28.6139, 77.2090)),
                ("Mumbai".to_string(), (19.0760, 72.8777)),
                ("Kolkata".to_string(), (22.5726, 88.3639)),
                ("Chennai".to_string(), (13.0827, 80.2707)),
                ("Bengaluru".to_string(), (12.9716, 77.5946)),
                ("Hyderabad".to_string(), (17.3850, 78.4867)),
            ],
        }
    }

    /// Generates readings covering `days` days ending at `end`, one reading
    /// every few hours per city, with pollution levels scaled per city.
    pub fn generate(&self, end: NaiveDateTime, days: i64) -> Result<Vec<Reading>> {
        let days = days.max(1);
        let start = end - Duration::days(days);
        let mut rng = thread_rng();
        let mut readings = Vec::new();

        for (city, (lat, lon)) in &self.cities {
            let factor = Self::city_factor(city);
            let mut timestamp = start;
            while timestamp <= end {
                let pm25 = (rng.gen_range(5.0..90.0) * factor).min(500.0);
                let aqi = compute_aqi(pm25)?;
                let risk = classify_risk(aqi)?;

                // Coordinates wobble slightly per reading, like real stations.
                let lat_variation = rng.gen_range(-0.05..0.05);
                let lon_variation = rng.gen_range(-0.05..0.05);

                let pm10 = pm25 * rng.gen_range(1.2..2.5);
                let no2 = rng.gen_range(10.0..60.0) * factor;
                let so2 = rng.gen_range(2.0..20.0) * factor;
                let co = rng.gen_range(200.0..1200.0) * factor;

                readings.push(Reading {
                    city: city.clone(),
                    timestamp,
                    pm25,
                    pm10: Self::maybe(&mut rng, pm10),
                    no2: Self::maybe(&mut rng, no2),
                    so2: Self::maybe(&mut rng, so2),
                    co: Self::maybe(&mut rng, co),
                    latitude: Some(lat + lat_variation),
                    longitude: Some(lon + lon_variation),
                    aqi,
                    risk,
                });

                timestamp += Duration::hours(STEP_HOURS);
            }
        }

        readings.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        debug!(
            "Generated {} sample readings over {} days",
            readings.len(),
            days
        );
        Ok(readings)
    }

    /// Relative pollution baseline per city.
    fn city_factor(city: &str) -> f64 {
        match city {
            "Delhi" => 2.2,
            "Kolkata" => 1.8,
            "Mumbai" => 1.2,
            "Hyderabad" => 1.1,
            "Chennai" => 1.0,
            "Bengaluru" => 0.9,
            _ => 1.0,
        }
    }

    /// A small share of optional values comes back missing, like real feeds.
    fn maybe(rng: &mut impl Rng, value: f64) -> Option<f64> {
        if rng.gen_bool(0.05) {
            None
        } else {
            Some(value)
        }
    }
}

impl Default for SampleDataProvider {
    fn default() -> Self {
        Self::new()
    }
}
