//! Cache key derivation
//!
//! Keys are built from the validated request parameters. Coordinates are
//! rounded to the four decimal places the upstream API resolves, so two
//! requests that would hit the same grid point share an entry.

/// Decimal places kept in coordinate fingerprints.
pub const COORDINATE_PRECISION: i32 = 4;

/// Rounds a coordinate to [`COORDINATE_PRECISION`] places.
///
/// Negative zero is folded into zero so `-0.00001` and `0.0` agree.
pub fn round_coordinate(value: f64) -> f64 {
    let scale = 10f64.powi(COORDINATE_PRECISION);
    (value * scale).round() / scale + 0.0
}

/// Formats a coordinate the way it appears in keys and upstream URLs.
pub fn format_coordinate(value: f64) -> String {
    format!(
        "{:.*}",
        COORDINATE_PRECISION as usize,
        round_coordinate(value)
    )
}

pub fn alerts_key(state: &str) -> String {
    format!("alerts:{}", state)
}

pub fn points_key(latitude: f64, longitude: f64) -> String {
    format!(
        "points:{}:{}",
        format_coordinate(latitude),
        format_coordinate(longitude)
    )
}

/// The forecast document is identified by its URL; the coordinates only
/// group entries for the same grid point.
pub fn forecast_key(latitude: f64, longitude: f64, url: &str) -> String {
    format!(
        "forecast:{}:{}:{}",
        format_coordinate(latitude),
        format_coordinate(longitude),
        url
    )
}
