//! Authentication models for DeviceVault

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{User, UserRole};

/// Pending authentication challenge, single-use
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub wallet_address: String,
    pub nonce: String,
    pub message: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Challenge {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Request for authentication challenge
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChallengeRequest {
    pub wallet_address: String,
}

/// Response containing the authentication challenge
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    /// Message the wallet must sign
    pub challenge: String,
    pub wallet_address: String,
    pub nonce: String,
    pub expires_at: DateTime<Utc>,
}

impl From<Challenge> for ChallengeResponse {
    fn from(challenge: Challenge) -> Self {
        Self {
            challenge: challenge.message,
            wallet_address: challenge.wallet_address,
            nonce: challenge.nonce,
            expires_at: challenge.expires_at,
        }
    }
}

/// Request to verify a signed challenge
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VerifyRequest {
    pub wallet_address: String,
    pub signature: String, // Base64-encoded signature
    pub challenge: String,
}

/// Session token response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokenResponse {
    pub token: String,
    pub token_type: String,
    /// Seconds until expiry
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

/// User response (sanitized for API)
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub wallet_address: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub company: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            wallet_address: user.wallet_address,
            email: user.email,
            name: user.name,
            company: user.company,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Decoded session as seen by the token guard
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user_id: Option<Uuid>,
    pub wallet_address: String,
    pub role: UserRole,
    pub expires_at: DateTime<Utc>,
}
