//! Route definitions for the DeviceVault API

mod auth;
mod certificate;
mod intake;

use axum::{middleware::from_fn_with_state, Router};

use crate::middleware::require_session;
use crate::state::AppState;

pub use auth::{auth_routes, session_routes};
pub use certificate::{certificate_routes, public_certificate_routes};
pub use intake::intake_routes;

/// All `/api` routes; everything outside the public set sits behind the session guard
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .merge(auth_routes())
        .merge(public_certificate_routes());

    let protected = Router::new()
        .merge(session_routes())
        .merge(intake_routes())
        .merge(certificate_routes())
        .route_layer(from_fn_with_state(
            state.auth_service.clone(),
            require_session,
        ));

    Router::new().nest("/api", public.merge(protected))
}
