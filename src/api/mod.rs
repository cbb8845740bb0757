//! API Module
//!
//! HTTP handlers and routing for the relay.
//!
//! # Endpoints
//! - `GET /alerts/:state` - Active alerts, optional `?severity=` filter
//! - `GET /forecast/:lat/:lon` - Grid metadata and forecast for a coordinate
//! - `GET /stats` - Cache and rate limiter statistics
//! - `DELETE /cache` - Drop every cached response
//! - `GET /health` - Check the upstream and report cache and rate usage

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
