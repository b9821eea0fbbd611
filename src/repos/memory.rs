//! In-memory storage backend

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::*;

#[derive(Default)]
pub struct MemoryStore {
    // Challenge check-and-remove happens under this single lock
    challenges: Mutex<HashMap<String, Challenge>>,
    revoked: RwLock<HashMap<String, DateTime<Utc>>>,
    users: RwLock<HashMap<Uuid, User>>,
    drafts: RwLock<HashMap<Uuid, Draft>>,
    submissions: RwLock<HashMap<Uuid, Submission>>,
    certificates: RwLock<HashMap<Uuid, Certificate>>,
}

#[async_trait]
impl ChallengeStore for MemoryStore {
    async fn put(&self, challenge: &Challenge) -> Result<(), StoreError> {
        let mut challenges = self.challenges.lock().await;
        challenges.insert(challenge.wallet_address.clone(), challenge.clone());
        Ok(())
    }

    async fn consume(
        &self,
        wallet_address: &str,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<Challenge, ConsumeChallengeError> {
        let mut challenges = self.challenges.lock().await;

        match challenges.get(wallet_address) {
            Some(pending) if pending.message == message => {}
            _ => return Err(ConsumeChallengeError::NotFound),
        }

        let challenge = challenges
            .remove(wallet_address)
            .ok_or(ConsumeChallengeError::NotFound)?;

        if challenge.is_expired(now) {
            return Err(ConsumeChallengeError::Expired);
        }

        Ok(challenge)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut challenges = self.challenges.lock().await;
        let before = challenges.len();
        challenges.retain(|_, c| !c.is_expired(now));
        Ok((before - challenges.len()) as u64)
    }
}

#[async_trait]
impl TokenDenylist for MemoryStore {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        self.revoked
            .write()
            .await
            .insert(jti.to_string(), expires_at);
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, StoreError> {
        Ok(self.revoked.read().await.contains_key(jti))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut revoked = self.revoked.write().await;
        let before = revoked.len();
        revoked.retain(|_, expires_at| *expires_at > now);
        Ok((before - revoked.len()) as u64)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_wallet(&self, wallet_address: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.wallet_address == wallet_address)
            .cloned())
    }

    async fn insert_or_get(&self, user: &User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        if let Some(existing) = users
            .values()
            .find(|u| u.wallet_address == user.wallet_address)
        {
            return Ok(existing.clone());
        }

        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate<'_>,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(email) = update.email {
            user.email = Some(email.to_string());
        }
        if let Some(name) = update.name {
            user.name = Some(name.to_string());
        }
        if let Some(company) = update.company {
            user.company = Some(company.to_string());
        }
        user.updated_at = now;

        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl DraftRepository for MemoryStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<Draft>, StoreError> {
        Ok(self.drafts.read().await.get(&user_id).cloned())
    }

    async fn upsert(&self, draft: &Draft) -> Result<(), StoreError> {
        self.drafts
            .write()
            .await
            .insert(draft.user_id, draft.clone());
        Ok(())
    }

    async fn delete(&self, user_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.drafts.write().await.remove(&user_id).is_some())
    }
}

#[async_trait]
impl SubmissionRepository for MemoryStore {
    async fn insert(&self, submission: &Submission) -> Result<(), StoreError> {
        self.submissions
            .write()
            .await
            .insert(submission.id, submission.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Submission>, StoreError> {
        Ok(self.submissions.read().await.get(&id).cloned())
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Submission>, StoreError> {
        let submissions = self.submissions.read().await;
        let mut list: Vec<Submission> = submissions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn list(&self, status: Option<SubmissionStatus>) -> Result<Vec<Submission>, StoreError> {
        let submissions = self.submissions.read().await;
        let mut list: Vec<Submission> = submissions
            .values()
            .filter(|s| status.map_or(true, |status| s.status == status))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn review_pending(
        &self,
        id: Uuid,
        decision: ReviewDecision<'_>,
    ) -> Result<Option<Submission>, StoreError> {
        let mut submissions = self.submissions.write().await;
        let Some(submission) = submissions.get_mut(&id) else {
            return Ok(None);
        };

        if submission.status != SubmissionStatus::Pending {
            return Ok(None);
        }

        submission.status = decision.status;
        submission.review_notes = decision.notes.map(str::to_string);
        submission.reviewed_by = Some(decision.reviewed_by);
        submission.updated_at = decision.reviewed_at;

        Ok(Some(submission.clone()))
    }
}

#[async_trait]
impl CertificateRepository for MemoryStore {
    async fn insert_or_get(&self, cert: &Certificate) -> Result<(Certificate, bool), StoreError> {
        let mut certificates = self.certificates.write().await;

        if let Some(existing) = certificates
            .values()
            .find(|c| c.submission_id == cert.submission_id)
        {
            return Ok((existing.clone(), false));
        }

        certificates.insert(cert.id, cert.clone());
        Ok((cert.clone(), true))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Certificate>, StoreError> {
        Ok(self.certificates.read().await.get(&id).cloned())
    }
}
