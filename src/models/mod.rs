//! Request and Response models for the relay's HTTP surface
//!
//! DTOs used for deserializing query strings and serializing response bodies.

pub mod requests;
pub mod responses;

pub use requests::AlertsQuery;
pub use responses::{ClearCacheResponse, ErrorResponse, HealthResponse, StatsResponse};
