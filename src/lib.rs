//! Weather Relay - A resilient client for the National Weather Service API
//!
//! Validates requests, caches responses with a TTL, bounds outbound traffic
//! with a rolling-window rate limiter and retries transient upstream
//! failures with exponential backoff.

pub mod api;
pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod limiter;
pub mod models;
pub mod tasks;
pub mod validators;

pub use api::AppState;
pub use client::{WeatherClient, WeatherRequest};
pub use config::Config;
pub use error::{FetchFailure, Result, WeatherError};
pub use tasks::spawn_sweep_task;
