//! Device submission handlers, including the backoffice review queue

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use std::sync::Arc;
use uuid::Uuid;

use super::{AuthenticatedUser, OperatorUser};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreateSubmissionRequest, ReviewSubmissionRequest, Submission, SubmissionListQuery,
};
use crate::services::IntakeService;

/// POST /api/submissions
pub async fn create_submission(
    State(intake): State<Arc<IntakeService>>,
    user: AuthenticatedUser,
    WithRejection(Json(req), _): WithRejection<Json<CreateSubmissionRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<Submission>)> {
    let submission = intake.create_submission(&user, req).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

/// GET /api/submissions
pub async fn list_submissions(
    State(intake): State<Arc<IntakeService>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<Submission>>> {
    Ok(Json(intake.list_own_submissions(&user).await?))
}

/// GET /api/submissions/:id
pub async fn get_submission(
    State(intake): State<Arc<IntakeService>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Submission>> {
    let id = parse_submission_id(&id)?;
    Ok(Json(intake.get_submission(&user, id).await?))
}

/// GET /api/admin/submissions?status=
pub async fn list_all_submissions(
    State(intake): State<Arc<IntakeService>>,
    _operator: OperatorUser,
    WithRejection(Query(query), _): WithRejection<Query<SubmissionListQuery>, ApiError>,
) -> ApiResult<Json<Vec<Submission>>> {
    Ok(Json(intake.list_all_submissions(query.status).await?))
}

/// POST /api/admin/submissions/:id/review
pub async fn review_submission(
    State(intake): State<Arc<IntakeService>>,
    OperatorUser(operator): OperatorUser,
    Path(id): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<ReviewSubmissionRequest>, ApiError>,
) -> ApiResult<Json<Submission>> {
    let id = parse_submission_id(&id)?;
    Ok(Json(intake.review_submission(&operator, id, req).await?))
}

fn parse_submission_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Submission not found".to_string()))
}
