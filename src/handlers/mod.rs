//! API handlers for the DeviceVault backend

pub mod auth;
pub mod certificate;
pub mod draft;
pub mod health;
pub mod profile;
pub mod submission;

// Handlers take the identity through the middleware extractors
pub use crate::middleware::auth::{AuthenticatedUser, OperatorUser};
