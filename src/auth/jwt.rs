//! Session token generation and validation
//!
//! Session tokens are HS256 JWTs carrying the wallet identity.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{User, UserRole};

/// Minimum accepted length of the signing secret, in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Values that have shipped as defaults in sample env files
const PLACEHOLDER_SECRETS: &[&str] = &[
    "development-secret-change-in-production",
    "change-me-change-me-change-me-change-me",
    "your-secret-key-here-change-in-production",
    "secret",
];

/// Token-related errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("Signing secret must be at least {0} bytes and not a placeholder")]
    WeakSecret(usize),

    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Server-held secret used to sign session tokens
#[derive(Clone)]
pub struct SessionSecret(String);

impl SessionSecret {
    pub fn new(secret: impl Into<String>) -> Result<Self, TokenError> {
        let secret = secret.into();

        if secret.len() < MIN_SECRET_LEN || PLACEHOLDER_SECRETS.contains(&secret.as_str()) {
            return Err(TokenError::WeakSecret(MIN_SECRET_LEN));
        }

        Ok(Self(secret))
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionSecret(****)")
    }
}

/// JWT claims for session tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID), absent when no user record was resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Wallet address that signed the challenge
    pub wallet: String,
    /// User role
    pub role: UserRole,
    /// JWT ID (for revocation)
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Option<Uuid>, TokenError> {
        self.sub
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| TokenError::InvalidToken(e.to_string()))
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// A freshly signed token and the claims inside it
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Generate a session token for a user
///
/// # Arguments
/// * `user` - The authenticated user
/// * `jti` - Unique token identifier for revocation
/// * `secret` - Signing secret
/// * `issued_at` - Issue time, taken from the service clock
/// * `ttl_seconds` - Token time-to-live in seconds
pub fn generate_session_token(
    user: &User,
    jti: &str,
    secret: &SessionSecret,
    issued_at: DateTime<Utc>,
    ttl_seconds: i64,
) -> Result<IssuedToken, TokenError> {
    let exp = Duration::try_seconds(ttl_seconds)
        .and_then(|ttl| issued_at.checked_add_signed(ttl))
        .ok_or_else(|| {
            TokenError::EncodingFailed(format!("token lifetime of {}s is out of range", ttl_seconds))
        })?;

    let claims = Claims {
        sub: Some(user.id.to_string()),
        wallet: user.wallet_address.clone(),
        role: user.role,
        jti: jti.to_string(),
        iat: issued_at.timestamp(),
        exp: exp.timestamp(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::EncodingFailed(e.to_string()))?;

    Ok(IssuedToken { token, claims })
}

/// Verify and decode a session token
///
/// The signature and algorithm are checked by `jsonwebtoken`; expiry is
/// checked against `now` with no leeway.
pub fn verify_token(
    token: &str,
    secret: &SessionSecret,
    now: DateTime<Utc>,
) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| TokenError::DecodingFailed(e.to_string()))?;

    let claims = token_data.claims;
    if now.timestamp() >= claims.exp {
        return Err(TokenError::TokenExpired);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-that-is-long-enough-0001";

    fn create_test_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            wallet_address: "GAAZI4TCR3TY5OJHCTJC2A4QSY6CJWJH5IAJTGKIN2ER7LBNVKOCCWN7".to_string(),
            email: Some("test@example.com".to_string()),
            name: Some("Test User".to_string()),
            company: None,
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        }
    }

    fn secret() -> SessionSecret {
        SessionSecret::new(SECRET).unwrap()
    }

    #[test]
    fn test_generate_session_token() {
        let user = create_test_user();
        let jti = Uuid::new_v4().to_string();
        let now = Utc::now();

        let issued = generate_session_token(&user, &jti, &secret(), now, 900).unwrap();
        assert!(!issued.token.is_empty());
        assert_eq!(issued.claims.exp - issued.claims.iat, 900);

        let claims = verify_token(&issued.token, &secret(), now).unwrap();
        assert_eq!(claims.user_id().unwrap(), Some(user.id));
        assert_eq!(claims.wallet, user.wallet_address);
        assert_eq!(claims.jti, jti);
        assert_eq!(claims.role, UserRole::User);
    }

    #[test]
    fn test_expired_token() {
        let user = create_test_user();
        let issued_at = Utc::now() - Duration::seconds(1000);

        let issued = generate_session_token(&user, "jti", &secret(), issued_at, 900).unwrap();
        assert_eq!(
            verify_token(&issued.token, &secret(), Utc::now()),
            Err(TokenError::TokenExpired)
        );
    }

    #[test]
    fn test_token_rejected_exactly_at_expiry() {
        let user = create_test_user();
        let now = Utc::now();
        let issued = generate_session_token(&user, "jti", &secret(), now, 60).unwrap();

        let at_expiry = issued.claims.expires_at();
        assert!(verify_token(&issued.token, &secret(), at_expiry).is_err());
        assert!(verify_token(&issued.token, &secret(), at_expiry - Duration::seconds(1)).is_ok());
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        let user = create_test_user();

        for ttl in [10_000_000_000_000, i64::MAX] {
            let result = generate_session_token(&user, "jti", &secret(), Utc::now(), ttl);
            assert!(matches!(result, Err(TokenError::EncodingFailed(_))));
        }
    }

    #[test]
    fn test_invalid_token() {
        let result = verify_token("invalid.token.here", &secret(), Utc::now());
        assert!(matches!(result, Err(TokenError::DecodingFailed(_))));
    }

    #[test]
    fn test_wrong_secret() {
        let user = create_test_user();
        let other = SessionSecret::new("another-secret-key-that-is-long-enough-2").unwrap();

        let issued = generate_session_token(&user, "jti", &other, Utc::now(), 900).unwrap();
        assert!(verify_token(&issued.token, &secret(), Utc::now()).is_err());
    }

    #[test]
    fn test_weak_secrets_rejected() {
        assert!(SessionSecret::new("short").is_err());
        assert!(SessionSecret::new("development-secret-change-in-production").is_err());
        assert!(SessionSecret::new(SECRET).is_ok());
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        assert!(!format!("{:?}", secret()).contains(SECRET));
    }
}
