//! Request parameters and their validated form.

use url::Url;

use crate::cache::key::{alerts_key, forecast_key, format_coordinate, points_key};
use crate::error::{Result, WeatherError};
use crate::validators::{validate_coordinates, validate_state_code};

/// A request for upstream weather data, as supplied by a caller.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherRequest {
    /// Active alerts for a state or territory
    Alerts { state: String },
    /// Grid metadata for a coordinate, including its forecast link
    Points { latitude: f64, longitude: f64 },
    /// The forecast document behind a points response's forecast link
    Forecast {
        latitude: f64,
        longitude: f64,
        url: String,
    },
}

/// A request that passed validation: its cache key and upstream URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRequest {
    pub key: String,
    pub url: String,
}

impl WeatherRequest {
    pub fn alerts(state: impl Into<String>) -> Self {
        WeatherRequest::Alerts {
            state: state.into(),
        }
    }

    pub fn points(latitude: f64, longitude: f64) -> Self {
        WeatherRequest::Points {
            latitude,
            longitude,
        }
    }

    pub fn forecast(latitude: f64, longitude: f64, url: impl Into<String>) -> Self {
        WeatherRequest::Forecast {
            latitude,
            longitude,
            url: url.into(),
        }
    }

    /// Validates the parameters and derives the cache key and URL.
    ///
    /// Touches neither the cache nor the network.
    pub fn validate(&self, api_base: &str) -> Result<ValidRequest> {
        match self {
            WeatherRequest::Alerts { state } => {
                let state = validate_state_code(state)?;
                Ok(ValidRequest {
                    url: format!("{}/alerts/active/area/{}", api_base, state),
                    key: alerts_key(&state),
                })
            }
            WeatherRequest::Points {
                latitude,
                longitude,
            } => {
                let (latitude, longitude) = validate_coordinates(*latitude, *longitude)?;
                Ok(ValidRequest {
                    url: format!(
                        "{}/points/{},{}",
                        api_base,
                        format_coordinate(latitude),
                        format_coordinate(longitude)
                    ),
                    key: points_key(latitude, longitude),
                })
            }
            WeatherRequest::Forecast {
                latitude,
                longitude,
                url,
            } => {
                let (latitude, longitude) = validate_coordinates(*latitude, *longitude)?;
                let url = parse_http_url(url).map_err(WeatherError::Validation)?;
                Ok(ValidRequest {
                    key: forecast_key(latitude, longitude, url.as_str()),
                    url: url.into(),
                })
            }
        }
    }
}

/// Parses an absolute http(s) URL with a host.
///
/// The returned URL is normalized, so equivalent spellings share a cache key.
pub(crate) fn parse_http_url(raw: &str) -> std::result::Result<Url, String> {
    let url = Url::parse(raw.trim())
        .map_err(|e| format!("Forecast URL {:?} is not a valid URL: {}", raw, e))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(format!(
            "Forecast URL must use http or https scheme, got: {}",
            url.scheme()
        ));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(format!("Forecast URL {:?} has no host", raw));
    }

    Ok(url)
}
