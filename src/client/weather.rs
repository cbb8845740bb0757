//! Weather Client
//!
//! Single entry point tying validation, caching, rate limiting and the
//! retried upstream call together.
//!
//! A fetch moves through these states:
//!
//! ```text
//! Validating -> CacheCheck -> Hit -> Done
//!                          -> Miss -> RateCheck -> Denied -> Done(error)
//!                                               -> Granted -> Attempting
//! Attempting -> transient failure, attempts left -> Attempting
//!            -> success -> CacheStore -> Done
//!            -> terminal failure or attempts exhausted -> Done(error)
//! ```
//!
//! Locks on the cache and limiter are only held for the state transitions
//! themselves, never across an upstream call. Dropping a fetch future stops
//! any further attempts and leaves both structures consistent.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::cache::{CacheStats, CacheStore};
use crate::client::health::{HealthReport, HealthStatus, HEALTH_CHECK_PATH};
use crate::client::request::{parse_http_url, WeatherRequest};
use crate::client::retry::RetryPolicy;
use crate::client::transport::{HttpTransport, Transport};
use crate::clock::{SharedClock, SystemClock};
use crate::config::Config;
use crate::error::{FetchFailure, Result, WeatherError};
use crate::limiter::RateLimiter;

/// Points metadata together with the forecast it links to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub points: Value,
    pub forecast: Value,
}

/// Snapshot of the client's cache and limiter state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientStats {
    pub cache: CacheStats,
    pub rate_limit_used: u32,
    pub rate_limit_max: u32,
}

// == Weather Client ==
/// Caching, rate-limited, retrying client for the weather API.
///
/// Clones are handles onto the same cache and limiter. Clients built
/// separately with [`WeatherClient::new`] share nothing.
pub struct WeatherClient<T = HttpTransport> {
    config: Arc<Config>,
    transport: Arc<T>,
    retry: RetryPolicy,
    cache: Arc<RwLock<CacheStore>>,
    limiter: Arc<Mutex<RateLimiter>>,
}

impl<T> Clone for WeatherClient<T> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            transport: Arc::clone(&self.transport),
            retry: self.retry.clone(),
            cache: Arc::clone(&self.cache),
            limiter: Arc::clone(&self.limiter),
        }
    }
}

impl WeatherClient<HttpTransport> {
    /// Creates a client talking HTTP to `config.api_base`.
    pub fn from_config(config: Config) -> reqwest::Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(config, transport))
    }
}

impl<T: Transport> WeatherClient<T> {
    /// Creates a client on the system clock.
    pub fn new(config: Config, transport: T) -> Self {
        Self::with_clock(config, transport, Arc::new(SystemClock))
    }

    /// Creates a client whose cache and limiter read time from `clock`.
    pub fn with_clock(config: Config, transport: T, clock: SharedClock) -> Self {
        let cache = CacheStore::new(config.cache_max_entries, Arc::clone(&clock));
        let limiter = RateLimiter::new(config.rate_limit, config.rate_window, clock);

        Self {
            retry: RetryPolicy::from_config(&config),
            config: Arc::new(config),
            transport: Arc::new(transport),
            cache: Arc::new(RwLock::new(cache)),
            limiter: Arc::new(Mutex::new(limiter)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // == Fetch ==
    /// Fetches the payload for `request`, serving it from cache when possible.
    ///
    /// # Errors
    /// - `Validation` when the parameters are out of range; nothing else runs
    /// - `RateLimited` on a cache miss while the rate window is full
    /// - `Unavailable` on a terminal upstream failure or once all attempts
    ///   have failed transiently
    pub async fn fetch(&self, request: &WeatherRequest) -> Result<Value> {
        let request = request.validate(&self.config.api_base)?;

        let cached = self.cache.write().await.get(&request.key);
        if let Some(value) = cached {
            debug!(key = %request.key, "cache hit");
            return Ok(value);
        }
        debug!(key = %request.key, "cache miss");

        {
            let mut limiter = self.limiter.lock().await;
            if !limiter.try_acquire() {
                warn!(key = %request.key, "rate limit exceeded");
                return Err(WeatherError::RateLimited(format!(
                    "more than {} upstream requests in {}s, try again later",
                    limiter.limit(),
                    limiter.window().as_secs()
                )));
            }
        }

        let value = self.fetch_with_retry(&request.url).await?;

        self.cache
            .write()
            .await
            .put(&request.key, value.clone(), self.config.cache_ttl);
        info!(url = %request.url, "retrieved upstream data");

        Ok(value)
    }

    /// Runs the attempt loop for one URL.
    async fn fetch_with_retry(&self, url: &str) -> Result<Value> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(url, attempt, "requesting upstream");

            let outcome = match tokio::time::timeout(self.config.timeout, self.transport.get(url))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(FetchFailure::Timeout),
            };

            match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        info!(url, attempt, "upstream request succeeded after retrying");
                    }
                    return Ok(value);
                }
                Err(cause) if cause.is_transient() && self.retry.has_attempts_left(attempt) => {
                    let delay = self.retry.delay_for_attempt(attempt - 1);
                    warn!(
                        url,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        error = %cause,
                        "retryable upstream failure, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(cause) => {
                    if cause.is_transient() {
                        error!(url, attempts = attempt, error = %cause, "all upstream attempts exhausted");
                    } else {
                        error!(url, attempt, error = %cause, "terminal upstream failure");
                    }
                    return Err(WeatherError::Unavailable {
                        attempts: attempt,
                        cause,
                    });
                }
            }
        }
    }

    // == Convenience Operations ==
    /// Active alerts for a state or territory code.
    pub async fn alerts(&self, state: &str) -> Result<Value> {
        self.fetch(&WeatherRequest::alerts(state)).await
    }

    /// Resolves a coordinate to its grid point and fetches the forecast.
    ///
    /// A points document without a usable `properties.forecast` link is a
    /// terminal upstream failure.
    pub async fn forecast(&self, latitude: f64, longitude: f64) -> Result<Forecast> {
        let points = self
            .fetch(&WeatherRequest::points(latitude, longitude))
            .await?;

        let url = forecast_link(&points).ok_or_else(|| WeatherError::Unavailable {
            attempts: 1,
            cause: FetchFailure::Malformed("points response has no forecast link".to_string()),
        })?;

        let forecast = self
            .fetch(&WeatherRequest::forecast(latitude, longitude, url))
            .await?;

        Ok(Forecast { points, forecast })
    }

    // == Maintenance ==
    /// Drops expired cache entries, returning how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        self.cache.write().await.sweep_expired()
    }

    /// Drops every cached response, returning how many were removed.
    pub async fn clear_cache(&self) -> usize {
        let removed = self.cache.write().await.clear();
        info!(removed, "cache cleared");
        removed
    }

    // == Health ==
    /// Checks the upstream with one request, bypassing cache, limiter and
    /// retries, and reports the outcome alongside local usage.
    pub async fn health(&self) -> HealthReport {
        let url = format!("{}{}", self.config.api_base, HEALTH_CHECK_PATH);
        let started = tokio::time::Instant::now();

        let outcome = match tokio::time::timeout(self.config.timeout, self.transport.get(&url)).await
        {
            Ok(outcome) => outcome.map(|_| ()),
            Err(_) => Err(FetchFailure::Timeout),
        };
        let response_time = started.elapsed();

        let cache_entries = self.cache.read().await.len();
        let usage = self.limiter.lock().await.usage();
        let report = HealthReport::from_check(outcome, response_time, cache_entries, usage);

        match report.status {
            HealthStatus::Healthy => debug!(url = %url, "health check succeeded"),
            _ => warn!(url = %url, error = ?report.error, "health check failed"),
        }
        report
    }

    pub async fn stats(&self) -> ClientStats {
        let cache = self.cache.read().await.stats();
        let (rate_limit_used, rate_limit_max) = self.limiter.lock().await.usage();

        ClientStats {
            cache,
            rate_limit_used,
            rate_limit_max,
        }
    }
}

fn forecast_link(points: &Value) -> Option<String> {
    points
        .pointer("/properties/forecast")
        .and_then(Value::as_str)
        .and_then(|url| parse_http_url(url).ok())
        .map(String::from)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Replays a fixed script of outcomes, repeating the last one.
    #[derive(Debug)]
    struct ScriptedTransport {
        script: std::sync::Mutex<VecDeque<std::result::Result<Value, FetchFailure>>>,
        last: std::result::Result<Value, FetchFailure>,
        calls: AtomicU32,
        delay: Duration,
    }

    impl ScriptedTransport {
        fn new(
            script: Vec<std::result::Result<Value, FetchFailure>>,
            last: std::result::Result<Value, FetchFailure>,
        ) -> Self {
            Self {
                script: std::sync::Mutex::new(script.into()),
                last,
                calls: AtomicU32::new(0),
                delay: Duration::ZERO,
            }
        }

        fn always(outcome: std::result::Result<Value, FetchFailure>) -> Self {
            Self::new(Vec::new(), outcome)
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    impl Transport for ScriptedTransport {
        async fn get(&self, _url: &str) -> std::result::Result<Value, FetchFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| self.last.clone())
        }
    }

    fn test_config() -> Config {
        Config {
            timeout: Duration::from_secs(5),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(1),
            retry_max_delay: Duration::from_millis(4),
            ..Config::default()
        }
    }

    fn client_with(
        config: Config,
        transport: ScriptedTransport,
    ) -> (WeatherClient<Arc<ScriptedTransport>>, Arc<ScriptedTransport>, ManualClock) {
        let transport = Arc::new(transport);
        let clock = ManualClock::default();
        let client = WeatherClient::with_clock(config, Arc::clone(&transport), Arc::new(clock.clone()));
        (client, transport, clock)
    }

    fn calls(transport: &ScriptedTransport) -> u32 {
        transport.calls.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_success_is_cached() {
        let (client, transport, _) =
            client_with(test_config(), ScriptedTransport::always(Ok(json!({"features": []}))));

        let first = client.alerts("ca").await.unwrap();
        let second = client.alerts("CA").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls(&transport), 1);
        assert_eq!(client.stats().await.cache.hits, 1);
    }

    #[tokio::test]
    async fn test_transient_failures_then_success() {
        let transport = ScriptedTransport::new(
            vec![Err(FetchFailure::Server(503)), Err(FetchFailure::Timeout)],
            Ok(json!({"ok": true})),
        );
        let (client, transport, _) = client_with(test_config(), transport);

        let value = client.alerts("TX").await.unwrap();

        assert_eq!(value, json!({"ok": true}));
        assert_eq!(calls(&transport), 3);
        assert_eq!(client.stats().await.cache.total_entries, 1);

        client.alerts("TX").await.unwrap();
        assert_eq!(calls(&transport), 3, "second call should be served from cache");
    }

    #[tokio::test]
    async fn test_exhaustion_returns_unavailable() {
        let (client, transport, _) = client_with(
            test_config(),
            ScriptedTransport::always(Err(FetchFailure::Connect("refused".into()))),
        );

        let error = client.alerts("NY").await.unwrap_err();

        assert_eq!(
            error,
            WeatherError::Unavailable {
                attempts: 3,
                cause: FetchFailure::Connect("refused".into()),
            }
        );
        assert_eq!(calls(&transport), 3);
        assert_eq!(client.stats().await.cache.total_entries, 0);
    }

    #[tokio::test]
    async fn test_terminal_failure_short_circuits() {
        let (client, transport, _) =
            client_with(test_config(), ScriptedTransport::always(Err(FetchFailure::Client(404))));

        let error = client.fetch(&WeatherRequest::points(40.0, -75.0)).await.unwrap_err();

        assert!(matches!(
            error,
            WeatherError::Unavailable {
                attempts: 1,
                cause: FetchFailure::Client(404)
            }
        ));
        assert_eq!(calls(&transport), 1);
    }

    #[tokio::test]
    async fn test_malformed_body_is_terminal() {
        let (client, transport, _) = client_with(
            test_config(),
            ScriptedTransport::always(Err(FetchFailure::Malformed("eof".into()))),
        );

        assert!(client.alerts("WA").await.is_err());
        assert_eq!(calls(&transport), 1);
    }

    #[tokio::test]
    async fn test_validation_touches_nothing() {
        let (client, transport, _) =
            client_with(test_config(), ScriptedTransport::always(Ok(json!({}))));

        let error = client.fetch(&WeatherRequest::points(90.1, 0.0)).await.unwrap_err();

        assert!(matches!(error, WeatherError::Validation(_)));
        assert_eq!(calls(&transport), 0);
        let stats = client.stats().await;
        assert_eq!(stats.rate_limit_used, 0);
        assert_eq!(stats.cache.misses, 0);
    }

    #[tokio::test]
    async fn test_malformed_forecast_url_touches_nothing() {
        let (client, transport, _) =
            client_with(test_config(), ScriptedTransport::always(Ok(json!({}))));

        let error = client
            .fetch(&WeatherRequest::forecast(0.0, 0.0, "http://exa mple.com/%%"))
            .await
            .unwrap_err();

        assert!(matches!(error, WeatherError::Validation(_)));
        assert_eq!(calls(&transport), 0);
        assert_eq!(client.stats().await.rate_limit_used, 0);
    }

    #[tokio::test]
    async fn test_cache_hit_bypasses_rate_limiter() {
        let config = Config {
            rate_limit: 1,
            ..test_config()
        };
        let (client, transport, _) = client_with(config, ScriptedTransport::always(Ok(json!(1))));

        client.alerts("CA").await.unwrap();
        client.alerts("CA").await.unwrap();
        let error = client.alerts("OR").await.unwrap_err();

        assert!(matches!(error, WeatherError::RateLimited(_)));
        assert_eq!(calls(&transport), 1);
    }

    #[tokio::test]
    async fn test_rate_window_rolls_over() {
        let config = Config {
            rate_limit: 1,
            ..test_config()
        };
        let (client, _, clock) = client_with(config, ScriptedTransport::always(Ok(json!(1))));

        client.alerts("CA").await.unwrap();
        assert!(client.alerts("NV").await.is_err());

        clock.advance(Duration::from_secs(60));
        assert!(client.alerts("NV").await.is_ok());
    }

    #[tokio::test]
    async fn test_cache_expiry_triggers_refetch() {
        let (client, transport, clock) =
            client_with(test_config(), ScriptedTransport::always(Ok(json!(1))));

        client.alerts("CA").await.unwrap();
        clock.advance(Duration::from_secs(299));
        client.alerts("CA").await.unwrap();
        assert_eq!(calls(&transport), 1);

        clock.advance(Duration::from_secs(1));
        client.alerts("CA").await.unwrap();
        assert_eq!(calls(&transport), 2);
    }

    #[tokio::test]
    async fn test_attempt_timeout_is_retried() {
        let config = Config {
            timeout: Duration::from_millis(20),
            ..test_config()
        };
        let transport = ScriptedTransport::always(Ok(json!(1))).slow(Duration::from_secs(5));
        let (client, transport, _) = client_with(config, transport);

        let error = client.alerts("CA").await.unwrap_err();

        assert_eq!(
            error,
            WeatherError::Unavailable {
                attempts: 3,
                cause: FetchFailure::Timeout
            }
        );
        assert_eq!(calls(&transport), 3);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_leaves_state_usable() {
        let transport = ScriptedTransport::always(Ok(json!(1))).slow(Duration::from_millis(200));
        let (client, _, _) = client_with(test_config(), transport);

        let cancelled =
            tokio::time::timeout(Duration::from_millis(10), client.alerts("CA")).await;
        assert!(cancelled.is_err());

        let stats = client.stats().await;
        assert_eq!(stats.cache.total_entries, 0);
        assert_eq!(stats.rate_limit_used, 1);

        assert_eq!(client.alerts("CA").await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn test_forecast_follows_link() {
        let points = json!({
            "properties": {
                "forecast": "https://api.weather.gov/gridpoints/TOP/31,80/forecast"
            }
        });
        let forecast = json!({"properties": {"periods": [{"name": "Tonight"}]}});
        let transport = ScriptedTransport::new(vec![Ok(points.clone())], Ok(forecast.clone()));
        let (client, transport, _) = client_with(test_config(), transport);

        let result = client.forecast(39.7456, -97.0892).await.unwrap();

        assert_eq!(result, Forecast { points, forecast });
        assert_eq!(calls(&transport), 2);

        client.forecast(39.7456, -97.0892).await.unwrap();
        assert_eq!(calls(&transport), 2);
    }

    #[tokio::test]
    async fn test_forecast_without_link_is_unavailable() {
        let payloads = [
            json!({"properties": {}}),
            json!({"properties": {"forecast": "gridpoints/TOP/31,80/forecast"}}),
            json!({"properties": {"forecast": "http://exa mple.com/forecast"}}),
        ];

        for points in payloads {
            let (client, transport, _) =
                client_with(test_config(), ScriptedTransport::always(Ok(points.clone())));

            let error = client.forecast(10.0, 10.0).await.unwrap_err();

            assert!(
                matches!(
                    error,
                    WeatherError::Unavailable {
                        cause: FetchFailure::Malformed(_),
                        ..
                    }
                ),
                "{} should have no usable link",
                points
            );
            assert_eq!(calls(&transport), 1);
        }
    }

    #[tokio::test]
    async fn test_separate_clients_share_nothing() {
        let (first, _, _) = client_with(test_config(), ScriptedTransport::always(Ok(json!(1))));
        let (second, second_transport, _) =
            client_with(test_config(), ScriptedTransport::always(Ok(json!(2))));

        first.alerts("CA").await.unwrap();
        assert_eq!(second.alerts("CA").await.unwrap(), json!(2));
        assert_eq!(calls(&second_transport), 1);

        let handle = first.clone();
        assert_eq!(handle.alerts("CA").await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn test_sweep_expired() {
        let (client, _, clock) = client_with(test_config(), ScriptedTransport::always(Ok(json!(1))));

        client.alerts("CA").await.unwrap();
        client.alerts("NY").await.unwrap();
        clock.advance(Duration::from_secs(300));

        assert_eq!(client.sweep_expired().await, 2);
        assert_eq!(client.sweep_expired().await, 0);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_refetch() {
        let (client, transport, _) =
            client_with(test_config(), ScriptedTransport::always(Ok(json!(1))));

        client.alerts("CA").await.unwrap();
        client.alerts("NY").await.unwrap();

        assert_eq!(client.clear_cache().await, 2);
        assert_eq!(client.stats().await.cache.total_entries, 0);

        client.alerts("CA").await.unwrap();
        assert_eq!(calls(&transport), 3);
    }

    #[tokio::test]
    async fn test_health_bypasses_cache_and_limiter() {
        let config = Config {
            rate_limit: 1,
            ..test_config()
        };
        let (client, transport, _) = client_with(config, ScriptedTransport::always(Ok(json!(1))));
        client.alerts("CA").await.unwrap();

        let first = client.health().await;
        let second = client.health().await;

        assert_eq!(first.status, HealthStatus::Healthy);
        assert_eq!(second.status, HealthStatus::Healthy);
        assert_eq!(second.cache_entries, 1);
        assert_eq!((second.rate_limit_used, second.rate_limit_max), (1, 1));
        assert_eq!(calls(&transport), 3);
    }

    #[tokio::test]
    async fn test_health_reports_failures_without_retrying() {
        let (client, transport, _) = client_with(
            test_config(),
            ScriptedTransport::always(Err(FetchFailure::Server(503))),
        );
        let report = client.health().await;
        assert_eq!(report.status, HealthStatus::Degraded);
        assert_eq!(report.upstream_status, Some(503));
        assert_eq!(calls(&transport), 1);

        let config = Config {
            timeout: Duration::from_millis(20),
            ..test_config()
        };
        let slow = ScriptedTransport::always(Ok(json!(1))).slow(Duration::from_secs(5));
        let (client, _, _) = client_with(config, slow);
        let report = client.health().await;
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert!(report.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_concurrent_fetches() {
        let (client, _, _) = client_with(test_config(), ScriptedTransport::always(Ok(json!(1))));

        let handles: Vec<_> = ["CA", "NY", "TX", "FL", "WA", "OR"]
            .into_iter()
            .map(|state| {
                let client = client.clone();
                tokio::spawn(async move { client.alerts(state).await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(client.stats().await.cache.total_entries, 6);
    }
}
