//! Certificate routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::certificate;
use crate::state::AppState;

pub fn certificate_routes() -> Router<AppState> {
    Router::new().route(
        "/certificates/generate",
        post(certificate::generate_certificate),
    )
}

/// Verification is open to anyone holding a certificate id
pub fn public_certificate_routes() -> Router<AppState> {
    Router::new().route(
        "/certificates/:id/verify",
        get(certificate::verify_certificate),
    )
}
