//! Router assembly

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;

use crate::config::Environment;
use crate::handlers::health::health_check;
use crate::middleware;
use crate::routes;
use crate::state::AppState;

/// Build the full application router with its middleware stack
pub fn build_router(state: AppState, cors: CorsLayer, environment: Environment) -> Router {
    let mut app = Router::new()
        .route("/health", get(health_check))
        .merge(routes::api_routes(&state))
        .layer(from_fn(middleware::security_headers))
        .layer(from_fn_with_state(
            state.rate_limiter.clone(),
            middleware::rate_limit,
        ));

    if environment.is_production() {
        app = app.layer(from_fn(middleware::hsts_header));
    }

    app.layer(from_fn(middleware::request_tracing))
        .layer(cors)
        .with_state(state)
}

/// CORS from a comma separated origin list; permissive when unset
pub fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
