//! Input validation
//!
//! Pure checks run before any cache or network activity.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Result, WeatherError};

/// US states, DC and the inhabited territories served by the alerts API.
pub const VALID_STATES: [&str; 56] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY", "DC", "PR", "VI", "GU", "AS", "MP",
];

/// Validates a two-letter state or territory code and returns it uppercased.
pub fn validate_state_code(code: &str) -> Result<String> {
    let code = code.trim();
    if code.is_empty() {
        return Err(WeatherError::Validation(
            "State code cannot be empty".to_string(),
        ));
    }

    let code = code.to_ascii_uppercase();
    if code.chars().count() != 2 {
        return Err(WeatherError::Validation(
            "State code must be exactly 2 characters".to_string(),
        ));
    }

    if !VALID_STATES.contains(&code.as_str()) {
        return Err(WeatherError::Validation(format!(
            "Invalid state code: {}. Must be a valid US state/territory code.",
            code
        )));
    }

    Ok(code)
}

/// Validates latitude in [-90, 90] and longitude in [-180, 180].
///
/// NaN is outside every range and is rejected.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(f64, f64)> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(WeatherError::Validation(format!(
            "Latitude must be between -90 and 90 degrees, got {}",
            latitude
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(WeatherError::Validation(format!(
            "Longitude must be between -180 and 180 degrees, got {}",
            longitude
        )));
    }

    Ok((latitude, longitude))
}

// == Alert Severity ==
/// Severity levels reported by the alerts API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertSeverity {
    Extreme,
    Severe,
    Moderate,
    Minor,
}

impl AlertSeverity {
    /// The spelling used in upstream payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Extreme => "Extreme",
            AlertSeverity::Severe => "Severe",
            AlertSeverity::Moderate => "Moderate",
            AlertSeverity::Minor => "Minor",
        }
    }
}

impl FromStr for AlertSeverity {
    type Err = WeatherError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "extreme" => Ok(AlertSeverity::Extreme),
            "severe" => Ok(AlertSeverity::Severe),
            "moderate" => Ok(AlertSeverity::Moderate),
            "minor" => Ok(AlertSeverity::Minor),
            other => Err(WeatherError::Validation(format!(
                "Invalid severity: {}. Expected Extreme, Severe, Moderate or Minor.",
                other
            ))),
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
