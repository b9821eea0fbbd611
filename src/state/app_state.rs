use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::{AuthService, AuthSettings, SessionSecret};
use crate::clock::Clock;
use crate::middleware::RateLimiter;
use crate::repos::{Repositories, StorageBackend};
use crate::services::{CertificateService, IntakeService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub intake_service: Arc<IntakeService>,
    pub certificate_service: Arc<CertificateService>,
    pub rate_limiter: RateLimiter,
    pub storage: StorageBackend,
}

impl AppState {
    pub fn new(
        repos: Repositories,
        secret: SessionSecret,
        settings: AuthSettings,
        rate_limiter: RateLimiter,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            auth_service: Arc::new(AuthService::new(&repos, secret, settings, clock.clone())),
            intake_service: Arc::new(IntakeService::new(&repos, clock.clone())),
            certificate_service: Arc::new(CertificateService::new(&repos, clock)),
            rate_limiter,
            storage: repos.backend,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<IntakeService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.intake_service.clone()
    }
}

impl FromRef<AppState> for Arc<CertificateService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.certificate_service.clone()
    }
}

impl FromRef<AppState> for RateLimiter {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.rate_limiter.clone()
    }
}
