//! Intake wizard draft handlers

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::WithRejection;
use std::sync::Arc;

use super::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::models::{Draft, SaveDraftRequest};
use crate::services::IntakeService;

/// GET /api/drafts
pub async fn get_draft(
    State(intake): State<Arc<IntakeService>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Draft>> {
    Ok(Json(intake.get_draft(&user).await?))
}

/// PUT /api/drafts
pub async fn save_draft(
    State(intake): State<Arc<IntakeService>>,
    user: AuthenticatedUser,
    WithRejection(Json(req), _): WithRejection<Json<SaveDraftRequest>, ApiError>,
) -> ApiResult<Json<Draft>> {
    Ok(Json(intake.save_draft(&user, req).await?))
}

/// DELETE /api/drafts
pub async fn delete_draft(
    State(intake): State<Arc<IntakeService>>,
    user: AuthenticatedUser,
) -> ApiResult<StatusCode> {
    intake.delete_draft(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}
