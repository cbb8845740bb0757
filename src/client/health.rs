//! Upstream health reporting.

use std::time::Duration;

use serde::Serialize;

use crate::error::FetchFailure;

/// Path requested by the health check, relative to the API base.
pub const HEALTH_CHECK_PATH: &str = "/alerts/active/area/CA";

/// Overall verdict of a health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Upstream answered successfully
    Healthy,
    /// Upstream answered, but with an error status or an unreadable body
    Degraded,
    /// Upstream could not be reached
    Unhealthy,
}

/// Result of one upstream health check, plus local usage figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    /// Status code upstream answered with, when it was an error
    pub upstream_status: Option<u16>,
    pub error: Option<String>,
    pub response_time_ms: u64,
    pub cache_entries: usize,
    pub rate_limit_used: u32,
    pub rate_limit_max: u32,
}

impl HealthReport {
    /// Classifies the outcome of a single health check request.
    pub fn from_check(
        outcome: Result<(), FetchFailure>,
        response_time: Duration,
        cache_entries: usize,
        (rate_limit_used, rate_limit_max): (u32, u32),
    ) -> Self {
        let (status, upstream_status, error) = match outcome {
            Ok(()) => (HealthStatus::Healthy, None, None),
            Err(failure @ (FetchFailure::Server(code) | FetchFailure::Client(code))) => {
                (HealthStatus::Degraded, Some(code), Some(failure.to_string()))
            }
            Err(failure @ FetchFailure::Malformed(_)) => {
                (HealthStatus::Degraded, None, Some(failure.to_string()))
            }
            Err(failure) => (HealthStatus::Unhealthy, None, Some(failure.to_string())),
        };

        Self {
            status,
            upstream_status,
            error,
            response_time_ms: response_time.as_millis() as u64,
            cache_entries,
            rate_limit_used,
            rate_limit_max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: Result<(), FetchFailure>) -> HealthReport {
        HealthReport::from_check(outcome, Duration::from_millis(42), 3, (1, 60))
    }

    #[test]
    fn test_successful_check_is_healthy() {
        let healthy = report(Ok(()));

        assert_eq!(healthy.status, HealthStatus::Healthy);
        assert_eq!(healthy.upstream_status, None);
        assert_eq!(healthy.error, None);
        assert_eq!(healthy.response_time_ms, 42);
        assert_eq!(healthy.cache_entries, 3);
        assert_eq!((healthy.rate_limit_used, healthy.rate_limit_max), (1, 60));
    }

    #[test]
    fn test_error_status_is_degraded() {
        let server_error = report(Err(FetchFailure::Server(503)));
        assert_eq!(server_error.status, HealthStatus::Degraded);
        assert_eq!(server_error.upstream_status, Some(503));
        assert!(server_error.error.unwrap().contains("HTTP 503"));

        let malformed = report(Err(FetchFailure::Malformed("eof".into())));
        assert_eq!(malformed.status, HealthStatus::Degraded);
        assert_eq!(malformed.upstream_status, None);
    }

    #[test]
    fn test_unreachable_upstream_is_unhealthy() {
        for failure in [FetchFailure::Timeout, FetchFailure::Connect("refused".into())] {
            let unreachable = report(Err(failure));
            assert_eq!(unreachable.status, HealthStatus::Unhealthy);
            assert!(unreachable.error.is_some());
        }
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_value(report(Ok(()))).unwrap();
        assert_eq!(json["status"], "healthy");
    }
}
