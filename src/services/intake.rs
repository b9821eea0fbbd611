//! Intake wizard services: profile, drafts and device submissions

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::clock::Clock;
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthenticatedUser;
use crate::models::{
    CreateSubmissionRequest, Draft, ReviewSubmissionRequest, SaveDraftRequest, Submission,
    SubmissionStatus, UpdateProfileRequest, User,
};
use crate::repos::{
    DraftRepository, ProfileUpdate, Repositories, ReviewDecision, SubmissionRepository,
    UserRepository,
};

#[derive(Clone)]
pub struct IntakeService {
    users: Arc<dyn UserRepository>,
    drafts: Arc<dyn DraftRepository>,
    submissions: Arc<dyn SubmissionRepository>,
    clock: Arc<dyn Clock>,
}

impl IntakeService {
    pub fn new(repos: &Repositories, clock: Arc<dyn Clock>) -> Self {
        Self {
            users: repos.users.clone(),
            drafts: repos.drafts.clone(),
            submissions: repos.submissions.clone(),
            clock,
        }
    }

    /// Resolve the caller's profile, creating it on first use
    pub async fn profile(&self, caller: &AuthenticatedUser) -> ApiResult<User> {
        if let Some(user_id) = caller.user_id {
            if let Some(user) = self.users.find_by_id(user_id).await? {
                return Ok(user);
            }
        }

        if let Some(user) = self.users.find_by_wallet(&caller.wallet_address).await? {
            return Ok(user);
        }

        let user = User::new(&caller.wallet_address, caller.role, self.clock.now());
        let user = self.users.insert_or_get(&user).await?;
        tracing::info!(wallet = %user.wallet_address, user_id = %user.id, "Profile created");

        Ok(user)
    }

    pub async fn update_profile(
        &self,
        caller: &AuthenticatedUser,
        req: UpdateProfileRequest,
    ) -> ApiResult<User> {
        req.validate()?;

        let user = self.profile(caller).await?;
        let update = ProfileUpdate {
            email: req.email.as_deref(),
            name: req.name.as_deref(),
            company: req.company.as_deref(),
        };

        self.users
            .update_profile(user.id, update, self.clock.now())
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    pub async fn get_draft(&self, caller: &AuthenticatedUser) -> ApiResult<Draft> {
        let user = self.profile(caller).await?;
        self.drafts
            .get(user.id)
            .await?
            .ok_or_else(|| ApiError::NotFound("No draft saved".to_string()))
    }

    pub async fn save_draft(
        &self,
        caller: &AuthenticatedUser,
        req: SaveDraftRequest,
    ) -> ApiResult<Draft> {
        req.validate()?;

        let user = self.profile(caller).await?;
        let draft = Draft {
            user_id: user.id,
            current_step: req.current_step,
            data: req.data,
            updated_at: self.clock.now(),
        };
        self.drafts.upsert(&draft).await?;

        Ok(draft)
    }

    pub async fn delete_draft(&self, caller: &AuthenticatedUser) -> ApiResult<()> {
        let user = self.profile(caller).await?;
        self.drafts.delete(user.id).await?;
        Ok(())
    }

    /// File a submission; the caller's draft is discarded
    pub async fn create_submission(
        &self,
        caller: &AuthenticatedUser,
        req: CreateSubmissionRequest,
    ) -> ApiResult<Submission> {
        req.validate()?;

        let user = self.profile(caller).await?;
        let now = self.clock.now();
        let submission = Submission {
            id: Uuid::new_v4(),
            user_id: user.id,
            wallet_address: user.wallet_address.clone(),
            device_name: req.device_name,
            device_type: req.device_type,
            manufacturer: req.manufacturer,
            model: req.model,
            serial_number: req.serial_number,
            description: req.description,
            documents: req.documents,
            status: SubmissionStatus::Pending,
            review_notes: None,
            reviewed_by: None,
            created_at: now,
            updated_at: now,
        };

        self.submissions.insert(&submission).await?;
        self.drafts.delete(user.id).await?;

        tracing::info!(
            submission_id = %submission.id,
            user_id = %user.id,
            documents = submission.documents.len(),
            "Submission created"
        );

        Ok(submission)
    }

    pub async fn list_own_submissions(
        &self,
        caller: &AuthenticatedUser,
    ) -> ApiResult<Vec<Submission>> {
        let user = self.profile(caller).await?;
        Ok(self.submissions.list_by_user(user.id).await?)
    }

    /// Fetch a submission visible to the caller: their own, or any for staff.
    /// Others' submissions are reported as not found.
    pub async fn get_submission(
        &self,
        caller: &AuthenticatedUser,
        id: Uuid,
    ) -> ApiResult<Submission> {
        let not_found = || ApiError::NotFound("Submission not found".to_string());

        let submission = self.submissions.get(id).await?.ok_or_else(not_found)?;
        if caller.role.is_staff() {
            return Ok(submission);
        }

        let user = self.profile(caller).await?;
        if submission.user_id != user.id {
            return Err(not_found());
        }

        Ok(submission)
    }

    pub async fn list_all_submissions(
        &self,
        status: Option<SubmissionStatus>,
    ) -> ApiResult<Vec<Submission>> {
        Ok(self.submissions.list(status).await?)
    }

    pub async fn review_submission(
        &self,
        reviewer: &AuthenticatedUser,
        id: Uuid,
        req: ReviewSubmissionRequest,
    ) -> ApiResult<Submission> {
        req.validate()?;

        if req.status == SubmissionStatus::Pending {
            return Err(ApiError::ValidationError(
                "status must be APPROVED or REJECTED".to_string(),
            ));
        }

        let reviewer_user = self.profile(reviewer).await?;
        let decision = ReviewDecision {
            status: req.status,
            notes: req.notes.as_deref(),
            reviewed_by: reviewer_user.id,
            reviewed_at: self.clock.now(),
        };

        if let Some(submission) = self.submissions.review_pending(id, decision).await? {
            tracing::info!(
                submission_id = %id,
                reviewer = %reviewer_user.id,
                status = ?submission.status,
                "Submission reviewed"
            );
            return Ok(submission);
        }

        match self.submissions.get(id).await? {
            Some(_) => Err(ApiError::Conflict(
                "Submission has already been reviewed".to_string(),
            )),
            None => Err(ApiError::NotFound("Submission not found".to_string())),
        }
    }
}
