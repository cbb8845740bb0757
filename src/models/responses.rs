//! Response DTOs for the relay API

use serde::Serialize;

use crate::client::{ClientStats, HealthReport, HealthStatus};

/// Response body for `GET /stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub evictions: u64,
    pub total_entries: usize,
    /// hits / (hits + misses)
    pub hit_rate: f64,
    /// Upstream requests admitted in the current rate window
    pub rate_limit_used: u32,
    pub rate_limit_max: u32,
}

impl From<ClientStats> for StatsResponse {
    fn from(stats: ClientStats) -> Self {
        Self {
            hit_rate: stats.cache.hit_rate(),
            hits: stats.cache.hits,
            misses: stats.cache.misses,
            expirations: stats.cache.expirations,
            evictions: stats.cache.evictions,
            total_entries: stats.cache.total_entries,
            rate_limit_used: stats.rate_limit_used,
            rate_limit_max: stats.rate_limit_max,
        }
    }
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy", "degraded" or "unhealthy"
    pub status: HealthStatus,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Upstream the relay talks to
    pub api_base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub response_time_ms: u64,
    pub cache_entries: usize,
    pub rate_limit_used: u32,
    pub rate_limit_max: u32,
}

impl HealthResponse {
    pub fn new(report: HealthReport, api_base: impl Into<String>) -> Self {
        Self {
            status: report.status,
            timestamp: chrono::Utc::now().to_rfc3339(),
            api_base: api_base.into(),
            upstream_status: report.upstream_status,
            error: report.error,
            response_time_ms: report.response_time_ms,
            cache_entries: report.cache_entries,
            rate_limit_used: report.rate_limit_used,
            rate_limit_max: report.rate_limit_max,
        }
    }
}

/// Response body for `DELETE /cache`
#[derive(Debug, Clone, Serialize)]
pub struct ClearCacheResponse {
    /// Number of cached responses dropped
    pub cleared: usize,
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
