//! API Handlers
//!
//! HTTP request handlers exposing the weather client operations.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::client::{Forecast, HealthStatus, WeatherClient};
use crate::config::Config;
use crate::error::Result;
use crate::models::{AlertsQuery, ClearCacheResponse, HealthResponse, StatsResponse};
use crate::validators::AlertSeverity;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Weather client; clones share its cache and rate limiter
    pub client: WeatherClient,
}

impl AppState {
    pub fn new(client: WeatherClient) -> Self {
        Self { client }
    }

    /// Builds an HTTP-backed client from configuration.
    pub fn from_config(config: Config) -> reqwest::Result<Self> {
        Ok(Self::new(WeatherClient::from_config(config)?))
    }
}

/// Handler for GET /alerts/:state
///
/// Returns the active alerts payload, optionally narrowed to one severity.
pub async fn alerts_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<AlertsQuery>,
) -> Result<Json<Value>> {
    let severity = query.severity()?;
    let alerts = state.client.alerts(&code).await?;

    Ok(Json(match severity {
        Some(severity) => filter_by_severity(alerts, severity),
        None => alerts,
    }))
}

/// Handler for GET /forecast/:lat/:lon
pub async fn forecast_handler(
    State(state): State<AppState>,
    Path((latitude, longitude)): Path<(f64, f64)>,
) -> Result<Json<Forecast>> {
    let forecast = state.client.forecast(latitude, longitude).await?;
    Ok(Json(forecast))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.client.stats().await.into())
}

/// Handler for DELETE /cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearCacheResponse> {
    let cleared = state.client.clear_cache().await;
    Json(ClearCacheResponse { cleared })
}

/// Handler for GET /health
///
/// Checks the upstream once. Answers 503 when it cannot be reached and 200
/// otherwise, with the verdict in the body.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let report = state.client.health().await;
    let status = match report.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };

    let api_base = state.client.config().api_base.as_str();
    (status, Json(HealthResponse::new(report, api_base)))
}

/// Keeps only the features whose `properties.severity` matches.
///
/// Payloads without a `features` array are returned untouched.
pub fn filter_by_severity(mut alerts: Value, severity: AlertSeverity) -> Value {
    if let Some(features) = alerts.get_mut("features").and_then(Value::as_array_mut) {
        features.retain(|feature| {
            feature
                .pointer("/properties/severity")
                .and_then(Value::as_str)
                .is_some_and(|s| s == severity.as_str())
        });
    }
    alerts
}
