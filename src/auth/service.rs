//! Authentication service
//!
//! Core business logic for wallet-based authentication.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use rand::RngCore;
use thiserror::Error;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::Config;
use crate::models::{Challenge, SessionTokenResponse, User, UserRole, VerifyRequest};
use crate::repos::{
    ChallengeStore, ConsumeChallengeError, Repositories, StoreError, TokenDenylist,
    UserRepository,
};

use super::crypto::{is_valid_stellar_address, verify_stellar_signature};
use super::jwt::{generate_session_token, verify_token, Claims, SessionSecret, TokenError};

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Wallet address is not allowed")]
    WalletNotAllowed,

    #[error("Challenge is invalid or has expired")]
    InvalidChallenge,

    #[error("Signature verification failed")]
    InvalidSignature,

    #[error("Session token expired")]
    TokenExpired,

    #[error("Session token is invalid")]
    InvalidToken,

    #[error("Session token has been revoked")]
    TokenRevoked,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Token issuance failed: {0}")]
    Issuance(String),
}

/// Tunables for the challenge/response flow
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub app_name: String,
    pub challenge_ttl_seconds: i64,
    pub session_token_ttl_seconds: i64,
    pub wallet_denylist: HashSet<String>,
    pub admin_wallets: HashSet<String>,
    pub operator_wallets: HashSet<String>,
}

impl From<&Config> for AuthSettings {
    fn from(config: &Config) -> Self {
        Self {
            app_name: config.app_name.clone(),
            challenge_ttl_seconds: config.challenge_ttl_seconds,
            session_token_ttl_seconds: config.session_token_ttl_seconds,
            wallet_denylist: config.wallet_denylist.clone(),
            admin_wallets: config.admin_wallets.clone(),
            operator_wallets: config.operator_wallets.clone(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            app_name: "DeviceVault".to_string(),
            challenge_ttl_seconds: 300,
            session_token_ttl_seconds: 7 * 24 * 60 * 60,
            wallet_denylist: HashSet::new(),
            admin_wallets: HashSet::new(),
            operator_wallets: HashSet::new(),
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    challenges: Arc<dyn ChallengeStore>,
    denylist: Arc<dyn TokenDenylist>,
    users: Arc<dyn UserRepository>,
    secret: SessionSecret,
    settings: AuthSettings,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        repos: &Repositories,
        secret: SessionSecret,
        settings: AuthSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            challenges: repos.challenges.clone(),
            denylist: repos.denylist.clone(),
            users: repos.users.clone(),
            secret,
            settings,
            clock,
        }
    }

    /// Issue a challenge for wallet authentication
    ///
    /// Replaces any challenge still pending for the same wallet.
    pub async fn generate_challenge(&self, wallet_address: &str) -> Result<Challenge, AuthError> {
        let wallet_address = wallet_address.trim();

        if wallet_address.is_empty() {
            return Err(AuthError::Validation(
                "walletAddress is required".to_string(),
            ));
        }

        if !is_valid_stellar_address(wallet_address) {
            return Err(AuthError::Validation(
                "Invalid Stellar address format".to_string(),
            ));
        }

        if self.settings.wallet_denylist.contains(wallet_address) {
            tracing::warn!(wallet = %wallet_address, "Challenge refused for disallowed wallet");
            return Err(AuthError::WalletNotAllowed);
        }

        let now = self.clock.now();
        let nonce = generate_secure_nonce();
        let expires_at = Duration::try_seconds(self.settings.challenge_ttl_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                AuthError::Issuance(format!(
                    "challenge lifetime of {}s is out of range",
                    self.settings.challenge_ttl_seconds
                ))
            })?;

        // Human-readable message to sign
        let message = format!(
            "Sign this message to authenticate with {}:\n\nNonce: {}\nWallet: {}\nExpires: {}",
            self.settings.app_name,
            nonce,
            wallet_address,
            expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        let challenge = Challenge {
            wallet_address: wallet_address.to_string(),
            nonce,
            message,
            issued_at: now,
            expires_at,
        };

        self.challenges.put(&challenge).await?;
        let purged = self.challenges.purge_expired(now).await?;

        tracing::info!(
            wallet = %wallet_address,
            expires_at = %expires_at,
            purged,
            "Challenge issued"
        );

        Ok(challenge)
    }

    /// Verify a signed challenge and issue a session token
    pub async fn verify_signature(
        &self,
        req: &VerifyRequest,
    ) -> Result<SessionTokenResponse, AuthError> {
        for (field, value) in [
            ("walletAddress", &req.wallet_address),
            ("signature", &req.signature),
            ("challenge", &req.challenge),
        ] {
            if value.trim().is_empty() {
                return Err(AuthError::Validation(format!("{} is required", field)));
            }
        }

        let wallet_address = req.wallet_address.trim();
        let now = self.clock.now();

        // Consumed before the signature check: a failed attempt is terminal
        let challenge = self
            .challenges
            .consume(wallet_address, &req.challenge, now)
            .await
            .map_err(|e| match e {
                ConsumeChallengeError::NotFound | ConsumeChallengeError::Expired => {
                    tracing::warn!(wallet = %wallet_address, reason = %e, "Challenge rejected");
                    AuthError::InvalidChallenge
                }
                ConsumeChallengeError::Store(e) => AuthError::Store(e),
            })?;

        if let Err(e) =
            verify_stellar_signature(&challenge.wallet_address, &challenge.message, &req.signature)
        {
            tracing::warn!(wallet = %wallet_address, reason = %e, "Signature rejected");
            return Err(AuthError::InvalidSignature);
        }

        let user = self.get_or_create_user(&challenge.wallet_address).await?;

        let jti = Uuid::new_v4().to_string();
        let issued = generate_session_token(
            &user,
            &jti,
            &self.secret,
            now,
            self.settings.session_token_ttl_seconds,
        )
        .map_err(|e| AuthError::Issuance(e.to_string()))?;

        tracing::info!(wallet = %user.wallet_address, user_id = %user.id, "Session token issued");

        Ok(SessionTokenResponse {
            token: issued.token,
            token_type: "Bearer".to_string(),
            expires_in: issued.claims.exp - issued.claims.iat,
            expires_at: issued.claims.expires_at(),
            user: user.into(),
        })
    }

    /// Decode a bearer token and check it has not expired or been revoked
    pub async fn authenticate(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = verify_token(token, &self.secret, self.clock.now()).map_err(|e| match e {
            TokenError::TokenExpired => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

        if self.denylist.is_revoked(&claims.jti).await? {
            return Err(AuthError::TokenRevoked);
        }

        Ok(claims)
    }

    /// Revoke a session token until its natural expiry
    pub async fn revoke(&self, claims: &Claims) -> Result<(), AuthError> {
        self.denylist.revoke(&claims.jti, claims.expires_at()).await?;
        tracing::info!(wallet = %claims.wallet, jti = %claims.jti, "Session revoked");
        Ok(())
    }

    /// Drop expired challenges and denylist entries
    pub async fn purge_expired(&self) -> Result<(u64, u64), AuthError> {
        let now = self.clock.now();
        let challenges = self.challenges.purge_expired(now).await?;
        let revocations = self.denylist.purge_expired(now).await?;
        Ok((challenges, revocations))
    }

    /// Get or create a user by wallet address
    pub async fn get_or_create_user(&self, wallet_address: &str) -> Result<User, AuthError> {
        if let Some(user) = self.users.find_by_wallet(wallet_address).await? {
            return Ok(user);
        }

        let user = User::new(
            wallet_address,
            self.initial_role(wallet_address),
            self.clock.now(),
        );
        let user = self.users.insert_or_get(&user).await?;

        tracing::info!(wallet = %wallet_address, user_id = %user.id, role = ?user.role, "User created");

        Ok(user)
    }

    fn initial_role(&self, wallet_address: &str) -> UserRole {
        if self.settings.admin_wallets.contains(wallet_address) {
            UserRole::Admin
        } else if self.settings.operator_wallets.contains(wallet_address) {
            UserRole::Operator
        } else {
            UserRole::User
        }
    }
}

/// Generate a cryptographically secure nonce
fn generate_secure_nonce() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
