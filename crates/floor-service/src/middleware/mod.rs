//! Middleware for the floor service.

pub mod auth;
pub mod http_metrics;

pub use auth::{require_identity, IdentityState};
pub use http_metrics::http_metrics_middleware;
