//! Session token guard
//!
//! `require_session` runs in front of every protected route. It verifies the
//! bearer token and stores the resulting identity in the request extensions,
//! where handlers pick it up through the `AuthenticatedUser` extractor.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AuthService, Claims};
use crate::error::ApiError;
use crate::models::UserRole;

/// Identity attached to a request that passed the session guard
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Option<Uuid>,
    pub wallet_address: String,
    pub role: UserRole,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
    pub claims: Claims,
}

impl AuthenticatedUser {
    fn from_claims(claims: Claims) -> Result<Self, ApiError> {
        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::InvalidToken("Session token is invalid"))?;

        Ok(Self {
            user_id,
            wallet_address: claims.wallet.clone(),
            role: claims.role,
            jti: claims.jti.clone(),
            expires_at: claims.expires_at(),
            claims,
        })
    }
}

/// Middleware guarding protected routes
pub async fn require_session(
    State(auth_service): State<Arc<AuthService>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();

    let TypedHeader(Authorization(bearer)) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, &())
            .await
            .map_err(|_| ApiError::AuthenticationRequired)?;

    let claims = auth_service.authenticate(bearer.token()).await?;
    let user = AuthenticatedUser::from_claims(claims)?;

    tracing::debug!(wallet = %user.wallet_address, jti = %user.jti, "Session accepted");

    parts.extensions.insert(user);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(ApiError::AuthenticationRequired)
    }
}

/// Extractor for operator or admin sessions
#[derive(Debug, Clone)]
pub struct OperatorUser(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for OperatorUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !user.role.is_staff() {
            return Err(ApiError::Forbidden(
                "Operator or admin role required".to_string(),
            ));
        }

        Ok(OperatorUser(user))
    }
}
