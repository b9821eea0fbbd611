//! Certificate issuance and public verification

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use std::sync::Arc;
use uuid::Uuid;

use super::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    Certificate, CertificateVerification, GenerateCertificateRequest, PublicCertificate,
};
use crate::services::CertificateService;

/// POST /api/certificates/generate - 201 when issued now, 200 when it already existed
pub async fn generate_certificate(
    State(certificates): State<Arc<CertificateService>>,
    user: AuthenticatedUser,
    WithRejection(Json(req), _): WithRejection<Json<GenerateCertificateRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<Certificate>)> {
    let (cert, created) = certificates.generate(&user, req.submission_id).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(cert)))
}

/// GET /api/certificates/:id/verify - Public lookup, unknown ids are `valid: false`
pub async fn verify_certificate(
    State(certificates): State<Arc<CertificateService>>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<CertificateVerification>)> {
    let found = match Uuid::parse_str(&id) {
        Ok(id) => certificates.verify(id).await?,
        Err(_) => None,
    };

    let response = match found {
        Some(cert) => (
            StatusCode::OK,
            Json(CertificateVerification {
                valid: true,
                certificate: Some(PublicCertificate::from(&cert)),
            }),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(CertificateVerification {
                valid: false,
                certificate: None,
            }),
        ),
    };

    Ok(response)
}
