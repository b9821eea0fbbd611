//! Storage interfaces
//!
//! Every piece of persisted state sits behind one of these traits. Two
//! implementations exist: [`MemoryStore`] for development and tests, and
//! [`PgStore`] on top of a Postgres pool.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Certificate, Challenge, Draft, Submission, SubmissionStatus, User};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ConsumeChallengeError {
    #[error("challenge not found")]
    NotFound,

    #[error("challenge expired")]
    Expired,

    #[error(transparent)]
    Store(#[from] StoreError),
}

////////////////////////////////////////////////////////////////////////////////

/// Pending challenges, at most one per wallet
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Insert the challenge, replacing any pending one for the same wallet
    async fn put(&self, challenge: &Challenge) -> Result<(), StoreError>;

    /// Atomically remove and return the wallet's pending challenge if its
    /// message equals `message`. A different message leaves the pending
    /// challenge in place. An expired match is removed and reported as
    /// [`ConsumeChallengeError::Expired`].
    async fn consume(
        &self,
        wallet_address: &str,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<Challenge, ConsumeChallengeError>;

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Revoked session token ids, kept until the token would have expired
#[async_trait]
pub trait TokenDenylist: Send + Sync {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn is_revoked(&self, jti: &str) -> Result<bool, StoreError>;

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_wallet(&self, wallet_address: &str) -> Result<Option<User>, StoreError>;

    /// Insert a user; if the wallet is already registered the existing
    /// record is returned instead
    async fn insert_or_get(&self, user: &User) -> Result<User, StoreError>;

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate<'_>,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError>;
}

/// Profile fields to overwrite; `None` keeps the stored value
#[derive(Debug, Default, Clone, Copy)]
pub struct ProfileUpdate<'a> {
    pub email: Option<&'a str>,
    pub name: Option<&'a str>,
    pub company: Option<&'a str>,
}

#[async_trait]
pub trait DraftRepository: Send + Sync {
    async fn get(&self, user_id: Uuid) -> Result<Option<Draft>, StoreError>;

    async fn upsert(&self, draft: &Draft) -> Result<(), StoreError>;

    async fn delete(&self, user_id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn insert(&self, submission: &Submission) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Submission>, StoreError>;

    /// Newest first
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Submission>, StoreError>;

    /// Newest first, optionally filtered by status
    async fn list(&self, status: Option<SubmissionStatus>) -> Result<Vec<Submission>, StoreError>;

    /// Record a review decision if the submission is still pending.
    /// Returns `None` when it does not exist or was already reviewed.
    async fn review_pending(
        &self,
        id: Uuid,
        decision: ReviewDecision<'_>,
    ) -> Result<Option<Submission>, StoreError>;
}

#[derive(Debug, Clone, Copy)]
pub struct ReviewDecision<'a> {
    pub status: SubmissionStatus,
    pub notes: Option<&'a str>,
    pub reviewed_by: Uuid,
    pub reviewed_at: DateTime<Utc>,
}

#[async_trait]
pub trait CertificateRepository: Send + Sync {
    /// Insert a certificate unless one already exists for its submission.
    /// Returns the stored certificate and whether it was created now.
    async fn insert_or_get(&self, cert: &Certificate) -> Result<(Certificate, bool), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Certificate>, StoreError>;
}

////////////////////////////////////////////////////////////////////////////////

/// Which backend the repositories run on
#[derive(Clone)]
pub enum StorageBackend {
    Memory,
    Postgres(PgPool),
}

impl StorageBackend {
    pub fn name(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Postgres(_) => "postgres",
        }
    }
}

/// Repository handles injected into services
#[derive(Clone)]
pub struct Repositories {
    pub backend: StorageBackend,
    pub challenges: Arc<dyn ChallengeStore>,
    pub denylist: Arc<dyn TokenDenylist>,
    pub users: Arc<dyn UserRepository>,
    pub drafts: Arc<dyn DraftRepository>,
    pub submissions: Arc<dyn SubmissionRepository>,
    pub certificates: Arc<dyn CertificateRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::default());
        Self {
            backend: StorageBackend::Memory,
            challenges: store.clone(),
            denylist: store.clone(),
            users: store.clone(),
            drafts: store.clone(),
            submissions: store.clone(),
            certificates: store,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool.clone()));
        Self {
            backend: StorageBackend::Postgres(pool),
            challenges: store.clone(),
            denylist: store.clone(),
            users: store.clone(),
            drafts: store.clone(),
            submissions: store.clone(),
            certificates: store,
        }
    }
}
