//! Configuration Module
//!
//! Handles loading relay configuration from environment variables. The
//! resulting [`Config`] is built once at startup and shared read-only.

use std::env;
use std::str::FromStr;
use std::time::Duration;

// == Defaults ==
pub const DEFAULT_API_BASE: &str = "https://api.weather.gov";
pub const DEFAULT_USER_AGENT: &str = "weather-relay/0.1";
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 10_000;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 1000;
pub const DEFAULT_RATE_LIMIT: u32 = 60;
pub const DEFAULT_RATE_WINDOW_SECS: u64 = 60;
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Relay configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the upstream weather API
    pub api_base: String,
    /// User-Agent sent with every upstream request
    pub user_agent: String,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Maximum number of upstream attempts per fetch
    pub max_retries: u32,
    /// Backoff before the second attempt; doubles afterwards
    pub retry_base_delay: Duration,
    /// Upper bound on a single backoff delay
    pub retry_max_delay: Duration,
    /// How long a fetched response stays in the cache
    pub cache_ttl: Duration,
    /// LRU bound on cached responses, 0 = unbounded
    pub cache_max_entries: usize,
    /// Admitted upstream requests per rate window
    pub rate_limit: u32,
    /// Length of the rolling rate window
    pub rate_window: Duration,
    /// Background sweep interval in seconds
    pub cleanup_interval: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `WEATHER_API_BASE` - Upstream base URL (default: https://api.weather.gov)
    /// - `WEATHER_USER_AGENT` - Client identification (default: weather-relay/0.1)
    /// - `WEATHER_TIMEOUT` - Per-attempt timeout in seconds, fractional allowed (default: 30)
    /// - `WEATHER_MAX_RETRIES` - Attempts per fetch (default: 3)
    /// - `WEATHER_RETRY_DELAY_MS` - Backoff base in milliseconds (default: 1000)
    /// - `WEATHER_RETRY_MAX_DELAY_MS` - Backoff cap in milliseconds (default: 10000)
    /// - `WEATHER_CACHE_TTL` - Cache TTL in seconds (default: 300)
    /// - `WEATHER_CACHE_MAX_ENTRIES` - LRU bound, 0 disables it (default: 1000)
    /// - `WEATHER_RATE_LIMIT` - Requests per window (default: 60)
    /// - `WEATHER_RATE_WINDOW` - Window length in seconds, must be positive (default: 60)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    ///
    /// Missing or unparseable values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let timeout = lookup("WEATHER_TIMEOUT")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .filter(|d| !d.is_zero())
            .unwrap_or(defaults.timeout);

        // A zero-length window would admit everything.
        let rate_window = match parse_or(&lookup, "WEATHER_RATE_WINDOW", 0u64) {
            0 => defaults.rate_window,
            secs => Duration::from_secs(secs),
        };

        Self {
            api_base: lookup("WEATHER_API_BASE")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.api_base),
            user_agent: lookup("WEATHER_USER_AGENT")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.user_agent),
            timeout,
            max_retries: parse_or(&lookup, "WEATHER_MAX_RETRIES", defaults.max_retries),
            retry_base_delay: Duration::from_millis(parse_or(
                &lookup,
                "WEATHER_RETRY_DELAY_MS",
                DEFAULT_RETRY_DELAY_MS,
            )),
            retry_max_delay: Duration::from_millis(parse_or(
                &lookup,
                "WEATHER_RETRY_MAX_DELAY_MS",
                DEFAULT_RETRY_MAX_DELAY_MS,
            )),
            cache_ttl: Duration::from_secs(parse_or(
                &lookup,
                "WEATHER_CACHE_TTL",
                DEFAULT_CACHE_TTL_SECS,
            )),
            cache_max_entries: parse_or(
                &lookup,
                "WEATHER_CACHE_MAX_ENTRIES",
                defaults.cache_max_entries,
            ),
            rate_limit: parse_or(&lookup, "WEATHER_RATE_LIMIT", defaults.rate_limit),
            rate_window,
            cleanup_interval: parse_or(&lookup, "CLEANUP_INTERVAL", defaults.cleanup_interval),
            server_port: parse_or(&lookup, "SERVER_PORT", defaults.server_port),
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            retry_max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            rate_limit: DEFAULT_RATE_LIMIT,
            rate_window: Duration::from_secs(DEFAULT_RATE_WINDOW_SECS),
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL_SECS,
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}
