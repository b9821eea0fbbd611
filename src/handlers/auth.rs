//! Authentication HTTP handlers
//!
//! Endpoints for wallet challenge/response authentication.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::WithRejection;
use std::sync::Arc;

use super::AuthenticatedUser;
use crate::auth::AuthService;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    ChallengeRequest, ChallengeResponse, SessionResponse, SessionTokenResponse, VerifyRequest,
};

/// POST /api/auth/challenge - Issue a challenge for the wallet to sign
pub async fn request_challenge(
    State(auth_service): State<Arc<AuthService>>,
    WithRejection(Json(req), _): WithRejection<Json<ChallengeRequest>, ApiError>,
) -> ApiResult<Json<ChallengeResponse>> {
    let challenge = auth_service.generate_challenge(&req.wallet_address).await?;
    Ok(Json(challenge.into()))
}

/// POST /api/auth/verify - Exchange a signed challenge for a session token
pub async fn verify_signature(
    State(auth_service): State<Arc<AuthService>>,
    WithRejection(Json(req), _): WithRejection<Json<VerifyRequest>, ApiError>,
) -> ApiResult<Json<SessionTokenResponse>> {
    let session = auth_service.verify_signature(&req).await?;
    Ok(Json(session))
}

/// POST /api/auth/logout - Revoke the presented session token
pub async fn logout(
    State(auth_service): State<Arc<AuthService>>,
    user: AuthenticatedUser,
) -> ApiResult<StatusCode> {
    auth_service.revoke(&user.claims).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/session - Decoded session of the caller
pub async fn current_session(user: AuthenticatedUser) -> Json<SessionResponse> {
    Json(SessionResponse {
        user_id: user.user_id,
        wallet_address: user.wallet_address,
        role: user.role,
        expires_at: user.expires_at,
    })
}
