//! API middleware components

pub mod auth;
pub mod metrics;

pub use auth::RequireUser;
pub use metrics::metrics_middleware;
