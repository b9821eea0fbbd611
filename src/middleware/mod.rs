//! Middleware for the DeviceVault API
//!
//! Request tracing, rate limiting, security headers and the session guard.

pub mod auth;
mod rate_limiter;
mod security;
mod tracing;

pub use auth::{require_session, AuthenticatedUser, OperatorUser};
pub use rate_limiter::{client_key, rate_limit, RateLimiter};
pub use security::{hsts_header, security_headers};
pub use tracing::request_tracing;
