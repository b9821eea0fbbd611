//! Postgres storage backend

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::*;

const USER_COLUMNS: &str =
    "id, wallet_address, email, name, company, role, created_at, updated_at";

const SUBMISSION_COLUMNS: &str = "id, user_id, wallet_address, device_name, device_type, \
     manufacturer, model, serial_number, description, documents, status, review_notes, \
     reviewed_by, created_at, updated_at";

const CERTIFICATE_COLUMNS: &str = "id, submission_id, wallet_address, device_name, \
     manufacturer, model, serial_number, content_hash, issued_at";

#[derive(Clone)]
pub struct PgStore {
    db_pool: PgPool,
}

impl PgStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ChallengeStore for PgStore {
    async fn put(&self, challenge: &Challenge) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO auth_challenges (wallet_address, nonce, message, issued_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (wallet_address) DO UPDATE
            SET nonce = EXCLUDED.nonce,
                message = EXCLUDED.message,
                issued_at = EXCLUDED.issued_at,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(&challenge.wallet_address)
        .bind(&challenge.nonce)
        .bind(&challenge.message)
        .bind(challenge.issued_at)
        .bind(challenge.expires_at)
        .execute(&self.db_pool)
        .await?;

        Ok(())
    }

    async fn consume(
        &self,
        wallet_address: &str,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<Challenge, ConsumeChallengeError> {
        // Single statement: only one concurrent caller gets the row back
        let challenge: Challenge = sqlx::query_as(
            r#"
            DELETE FROM auth_challenges
            WHERE wallet_address = $1 AND message = $2
            RETURNING wallet_address, nonce, message, issued_at, expires_at
            "#,
        )
        .bind(wallet_address)
        .bind(message)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(StoreError::from)?
        .ok_or(ConsumeChallengeError::NotFound)?;

        if challenge.is_expired(now) {
            return Err(ConsumeChallengeError::Expired);
        }

        Ok(challenge)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let rows_affected = sqlx::query("DELETE FROM auth_challenges WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.db_pool)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

#[async_trait]
impl TokenDenylist for PgStore {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, expires_at, revoked_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.db_pool)
        .await?;

        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, StoreError> {
        let revoked: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE jti = $1)")
                .bind(jti)
                .fetch_one(&self.db_pool)
                .await?;

        Ok(revoked)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let rows_affected = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.db_pool)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(user)
    }

    async fn find_by_wallet(&self, wallet_address: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE wallet_address = $1"
        ))
        .bind(wallet_address)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(user)
    }

    async fn insert_or_get(&self, user: &User) -> Result<User, StoreError> {
        let inserted: Option<User> = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (id, wallet_address, email, name, company, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (wallet_address) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.wallet_address)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.company)
        .bind(user.role)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_optional(&self.db_pool)
        .await?;

        if let Some(user) = inserted {
            return Ok(user);
        }

        // Lost the race to a concurrent first login
        let existing = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE wallet_address = $1"
        ))
        .bind(&user.wallet_address)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(existing)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate<'_>,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                name = COALESCE($3, name),
                company = COALESCE($4, company),
                updated_at = $5
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.email)
        .bind(update.name)
        .bind(update.company)
        .bind(now)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl DraftRepository for PgStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<Draft>, StoreError> {
        let draft = sqlx::query_as(
            "SELECT user_id, current_step, data, updated_at FROM drafts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(draft)
    }

    async fn upsert(&self, draft: &Draft) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO drafts (user_id, current_step, data, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET current_step = EXCLUDED.current_step,
                data = EXCLUDED.data,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(draft.user_id)
        .bind(draft.current_step)
        .bind(&draft.data)
        .bind(draft.updated_at)
        .execute(&self.db_pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, user_id: Uuid) -> Result<bool, StoreError> {
        let rows_affected = sqlx::query("DELETE FROM drafts WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db_pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}

#[async_trait]
impl SubmissionRepository for PgStore {
    async fn insert(&self, submission: &Submission) -> Result<(), StoreError> {
        sqlx::query(&format!(
            r#"
            INSERT INTO submissions ({SUBMISSION_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#
        ))
        .bind(submission.id)
        .bind(submission.user_id)
        .bind(&submission.wallet_address)
        .bind(&submission.device_name)
        .bind(&submission.device_type)
        .bind(&submission.manufacturer)
        .bind(&submission.model)
        .bind(&submission.serial_number)
        .bind(&submission.description)
        .bind(sqlx::types::Json(&submission.documents))
        .bind(submission.status)
        .bind(&submission.review_notes)
        .bind(submission.reviewed_by)
        .bind(submission.created_at)
        .bind(submission.updated_at)
        .execute(&self.db_pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Submission>, StoreError> {
        let submission = sqlx::query_as(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(submission)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Submission>, StoreError> {
        let submissions = sqlx::query_as(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(submissions)
    }

    async fn list(&self, status: Option<SubmissionStatus>) -> Result<Vec<Submission>, StoreError> {
        let submissions = sqlx::query_as(&format!(
            r#"
            SELECT {SUBMISSION_COLUMNS} FROM submissions
            WHERE ($1::submission_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#
        ))
        .bind(status)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(submissions)
    }

    async fn review_pending(
        &self,
        id: Uuid,
        decision: ReviewDecision<'_>,
    ) -> Result<Option<Submission>, StoreError> {
        let submission = sqlx::query_as(&format!(
            r#"
            UPDATE submissions
            SET status = $2, review_notes = $3, reviewed_by = $4, updated_at = $5
            WHERE id = $1 AND status = 'PENDING'
            RETURNING {SUBMISSION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(decision.status)
        .bind(decision.notes)
        .bind(decision.reviewed_by)
        .bind(decision.reviewed_at)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(submission)
    }
}

#[async_trait]
impl CertificateRepository for PgStore {
    async fn insert_or_get(&self, cert: &Certificate) -> Result<(Certificate, bool), StoreError> {
        let inserted: Option<Certificate> = sqlx::query_as(&format!(
            r#"
            INSERT INTO certificates ({CERTIFICATE_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (submission_id) DO NOTHING
            RETURNING {CERTIFICATE_COLUMNS}
            "#
        ))
        .bind(cert.id)
        .bind(cert.submission_id)
        .bind(&cert.wallet_address)
        .bind(&cert.device_name)
        .bind(&cert.manufacturer)
        .bind(&cert.model)
        .bind(&cert.serial_number)
        .bind(&cert.content_hash)
        .bind(cert.issued_at)
        .fetch_optional(&self.db_pool)
        .await?;

        if let Some(cert) = inserted {
            return Ok((cert, true));
        }

        let existing = sqlx::query_as(&format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM certificates WHERE submission_id = $1"
        ))
        .bind(cert.submission_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok((existing, false))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Certificate>, StoreError> {
        let cert = sqlx::query_as(&format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM certificates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(cert)
    }
}
