//! Upstream transport
//!
//! The [`Transport`] trait is the seam between the client's retry loop and
//! the network. [`HttpTransport`] is the reqwest implementation used in
//! production; tests plug in scripted transports.

use std::future::Future;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::FetchFailure;

/// Media type the weather API serves its GeoJSON documents under.
pub const GEO_JSON: &str = "application/geo+json";

/// Performs a single GET against the upstream API.
///
/// Implementations make exactly one attempt and report failures as a
/// [`FetchFailure`]; retries and timeouts are applied by the caller.
pub trait Transport: Send + Sync + 'static {
    fn get(&self, url: &str) -> impl Future<Output = Result<Value, FetchFailure>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn get(&self, url: &str) -> impl Future<Output = Result<Value, FetchFailure>> + Send {
        (**self).get(url)
    }
}

// == HTTP Transport ==
/// reqwest-backed transport carrying the client identification headers.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Builds the HTTP client with the configured User-Agent and timeout.
    pub fn new(config: &Config) -> reqwest::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GEO_JSON));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Value, FetchFailure> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(url, status = status.as_u16(), "upstream returned error status");
            return Err(FetchFailure::from_status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| classify_error(&e))?;
        serde_json::from_slice(&body).map_err(|e| FetchFailure::Malformed(e.to_string()))
    }
}

/// Maps a reqwest error onto the failure taxonomy.
///
/// Errors reqwest cannot attribute to a timeout, a status or request
/// construction happen mid-exchange (resets, truncated bodies) and are
/// reported as connection errors.
pub fn classify_error(error: &reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        FetchFailure::Timeout
    } else if let Some(status) = error.status() {
        FetchFailure::from_status(status.as_u16())
    } else if error.is_builder() {
        FetchFailure::Request(error.to_string())
    } else if error.is_decode() {
        FetchFailure::Malformed(error.to_string())
    } else {
        FetchFailure::Connect(error.to_string())
    }
}
