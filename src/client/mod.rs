//! Client Module
//!
//! Validation, caching, rate limiting and retried upstream access behind
//! one [`WeatherClient`].

pub mod health;
pub mod request;
pub mod retry;
pub mod transport;
mod weather;

pub use health::{HealthReport, HealthStatus};
pub use request::{ValidRequest, WeatherRequest};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, Transport};
pub use weather::{ClientStats, Forecast, WeatherClient};
