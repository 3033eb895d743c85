//! Core record types: raw CSV rows, enriched readings and the risk category scale.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One row as it appears in the source CSV, before cleaning.
///
/// Column names follow the file's headers verbatim. Every pollutant value is
/// optional at this stage; rows without a PM2.5 value are dropped by the
/// loader before enrichment.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "PM2.5")]
    pub pm25: Option<f64>,
    #[serde(rename = "PM10")]
    pub pm10: Option<f64>,
    #[serde(rename = "NO2")]
    pub no2: Option<f64>,
    #[serde(rename = "SO2")]
    pub so2: Option<f64>,
    #[serde(rename = "CO")]
    pub co: Option<f64>,
    #[serde(rename = "Latitude", default)]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude", default)]
    pub longitude: Option<f64>,
}

/// A cleaned, enriched measurement row.
///
/// Created once at load time and never mutated afterwards; every analysis
/// query borrows a slice of these and allocates fresh output.
#[derive(Debug, Clone, Serialize)]
pub struct Reading {
    pub city: String,
    /// Timezone-naive measurement instant.
    pub timestamp: NaiveDateTime,
    pub pm25: f64,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub so2: Option<f64>,
    pub co: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Air Quality Index derived from PM2.5 at load time.
    pub aqi: f64,
    pub risk: RiskCategory,
}

impl Reading {
    /// Returns the concentration of the given pollutant, if present in the row.
    pub fn pollutant(&self, pollutant: Pollutant) -> Option<f64> {
        match pollutant {
            Pollutant::Pm25 => Some(self.pm25),
            Pollutant::Pm10 => self.pm10,
            Pollutant::No2 => self.no2,
            Pollutant::So2 => self.so2,
            Pollutant::Co => self.co,
        }
    }
}

/// The pollutant columns carried by every reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Pollutant {
    Pm25,
    Pm10,
    No2,
    So2,
    Co,
}

impl Pollutant {
    /// All pollutants in the column order of the source file.
    pub const ALL: [Pollutant; 5] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::No2,
        Pollutant::So2,
        Pollutant::Co,
    ];
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Pm10 => "PM10",
            Pollutant::No2 => "NO2",
            Pollutant::So2 => "SO2",
            Pollutant::Co => "CO",
        };
        write!(f, "{}", name)
    }
}

/// Health-risk category derived from an AQI value.
///
/// Variants are declared in increasing severity so the derived `Ord`
/// matches the scale: `Good < Moderate < ... < Hazardous`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RiskCategory {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl RiskCategory {
    /// Rank on the severity scale, starting at 0 for `Good`.
    #[allow(dead_code)] // Part of the risk scale alongside label/color/guidance
    pub fn severity_rank(self) -> u8 {
        self as u8
    }

    /// Human-readable category label.
    pub fn label(self) -> &'static str {
        match self {
            RiskCategory::Good => "Good",
            RiskCategory::Moderate => "Moderate",
            RiskCategory::UnhealthySensitive => "Unhealthy for Sensitive Groups",
            RiskCategory::Unhealthy => "Unhealthy",
            RiskCategory::VeryUnhealthy => "Very Unhealthy",
            RiskCategory::Hazardous => "Hazardous",
        }
    }

    /// Display color token (hex) associated with the category.
    pub fn color(self) -> &'static str {
        match self {
            RiskCategory::Good => "#00e400",
            RiskCategory::Moderate => "#ffff00",
            RiskCategory::UnhealthySensitive => "#ff7e00",
            RiskCategory::Unhealthy => "#ff0000",
            RiskCategory::VeryUnhealthy => "#8f3f97",
            RiskCategory::Hazardous => "#7e0023",
        }
    }

    /// One-line health guidance associated with the category.
    pub fn guidance(self) -> &'static str {
        match self {
            RiskCategory::Good => {
                "Air quality is satisfactory, and air pollution poses little or no risk."
            },
            RiskCategory::Moderate => {
                "Acceptable air quality, but some pollutants may be moderate health concern for sensitive individuals."
            },
            RiskCategory::UnhealthySensitive => {
                "Members of sensitive groups may experience health effects. General public less likely to be affected."
            },
            RiskCategory::Unhealthy => {
                "Everyone may begin to experience health effects. Sensitive groups may experience more serious effects."
            },
            RiskCategory::VeryUnhealthy => {
                "Health alert: The risk of health effects is increased for everyone."
            },
            RiskCategory::Hazardous => {
                "Health warning of emergency conditions. Entire population is likely to be affected."
            },
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
