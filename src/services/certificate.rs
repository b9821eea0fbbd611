//! Device certificates issued for approved submissions

use std::sync::Arc;

use serde_json::json;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthenticatedUser;
use crate::models::{Certificate, Submission, SubmissionStatus};
use crate::repos::{CertificateRepository, Repositories, SubmissionRepository, UserRepository};

#[derive(Clone)]
pub struct CertificateService {
    certificates: Arc<dyn CertificateRepository>,
    submissions: Arc<dyn SubmissionRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl CertificateService {
    pub fn new(repos: &Repositories, clock: Arc<dyn Clock>) -> Self {
        Self {
            certificates: repos.certificates.clone(),
            submissions: repos.submissions.clone(),
            users: repos.users.clone(),
            clock,
        }
    }

    /// Issue the certificate for a submission, or return the one already issued.
    /// The flag is true when the certificate was created by this call.
    pub async fn generate(
        &self,
        caller: &AuthenticatedUser,
        submission_id: Uuid,
    ) -> ApiResult<(Certificate, bool)> {
        let not_found = || ApiError::NotFound("Submission not found".to_string());
        let submission = self
            .submissions
            .get(submission_id)
            .await?
            .ok_or_else(not_found)?;

        if !caller.role.is_staff() && !self.owns(caller, &submission).await? {
            return Err(not_found());
        }

        if submission.status != SubmissionStatus::Approved {
            return Err(ApiError::Conflict(
                "Certificates are only issued for approved submissions".to_string(),
            ));
        }

        let issued_at = self.clock.now();
        let cert = Certificate {
            id: Uuid::new_v4(),
            submission_id: submission.id,
            wallet_address: submission.wallet_address.clone(),
            device_name: submission.device_name.clone(),
            manufacturer: submission.manufacturer.clone(),
            model: submission.model.clone(),
            serial_number: submission.serial_number.clone(),
            content_hash: String::new(),
            issued_at,
        };
        let cert = Certificate {
            content_hash: content_hash(&cert),
            ..cert
        };

        let (cert, created) = self.certificates.insert_or_get(&cert).await?;
        if created {
            tracing::info!(
                certificate_id = %cert.id,
                submission_id = %cert.submission_id,
                "Certificate issued"
            );
        }

        Ok((cert, created))
    }

    /// Look up a certificate whose stored hash still matches its fields
    pub async fn verify(&self, id: Uuid) -> ApiResult<Option<Certificate>> {
        let Some(cert) = self.certificates.get(id).await? else {
            return Ok(None);
        };

        if content_hash(&cert) != cert.content_hash {
            tracing::warn!(certificate_id = %cert.id, "Certificate content hash mismatch");
            return Ok(None);
        }

        Ok(Some(cert))
    }

    async fn owns(&self, caller: &AuthenticatedUser, submission: &Submission) -> ApiResult<bool> {
        if caller.user_id == Some(submission.user_id) {
            return Ok(true);
        }

        let owner = self.users.find_by_wallet(&caller.wallet_address).await?;
        Ok(owner.is_some_and(|user| user.id == submission.user_id))
    }
}

/// Hex SHA-256 over the canonical JSON of the certified fields.
/// Object keys serialize sorted and the timestamp at second precision.
pub fn content_hash(cert: &Certificate) -> String {
    let canonical = json!({
        "submissionId": cert.submission_id,
        "walletAddress": cert.wallet_address,
        "deviceName": cert.device_name,
        "manufacturer": cert.manufacturer,
        "model": cert.model,
        "serialNumber": cert.serial_number,
        "issuedAt": cert.issued_at.timestamp(),
    });

    hex::encode(Sha256::digest(canonical.to_string().as_bytes()))
}
