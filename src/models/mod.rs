//! Data models for the DeviceVault backend

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod auth;
pub mod certificate;
pub mod intake;

pub use auth::*;
pub use certificate::*;
pub use intake::*;

/// User model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub wallet_address: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub company: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(wallet_address: &str, role: UserRole, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet_address: wallet_address.to_string(),
            email: None,
            name: None,
            company: None,
            role,
            created_at: now,
            updated_at: now,
        }
    }
}

/// User roles
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
pub enum UserRole {
    #[default]
    User,
    Operator,
    Admin,
}

impl UserRole {
    /// Backoffice staff can review any submission
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Operator | UserRole::Admin)
    }
}

/// Device submission filed through the intake wizard
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub wallet_address: String,
    pub device_name: String,
    pub device_type: String,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub description: Option<String>,
    #[sqlx(json)]
    pub documents: Vec<DocumentRef>,
    pub status: SubmissionStatus,
    pub review_notes: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Submission review status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "submission_status", rename_all = "UPPERCASE")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

/// Reference to an uploaded supporting document
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, validator::Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DocumentRef {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(url)]
    pub url: String,
    #[validate(length(min = 1, max = 100))]
    pub content_type: String,
}

/// In-progress wizard state, one per user
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub user_id: Uuid,
    pub current_step: i32,
    pub data: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// Certificate issued for an approved submission
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub wallet_address: String,
    pub device_name: String,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub content_hash: String,
    pub issued_at: DateTime<Utc>,
}

