//! Profile handlers

use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use std::sync::Arc;

use super::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::models::{UpdateProfileRequest, UserResponse};
use crate::services::IntakeService;

/// GET /api/profile
pub async fn get_profile(
    State(intake): State<Arc<IntakeService>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<UserResponse>> {
    let profile = intake.profile(&user).await?;
    Ok(Json(profile.into()))
}

/// PUT /api/profile - Absent fields keep their current value
pub async fn update_profile(
    State(intake): State<Arc<IntakeService>>,
    user: AuthenticatedUser,
    WithRejection(Json(req), _): WithRejection<Json<UpdateProfileRequest>, ApiError>,
) -> ApiResult<Json<UserResponse>> {
    let profile = intake.update_profile(&user, req).await?;
    Ok(Json(profile.into()))
}
