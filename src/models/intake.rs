//! Request bodies for the intake wizard: profile, drafts and submissions

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::{DocumentRef, SubmissionStatus};

/// Profile update; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProfileRequest {
    #[validate(email, length(max = 200))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub company: Option<String>,
}

/// Save the wizard draft
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SaveDraftRequest {
    #[validate(range(min = 1, max = 10))]
    pub current_step: i32,
    #[validate(custom = "validate_json_object")]
    pub data: serde_json::Value,
}

/// File a new device submission
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateSubmissionRequest {
    #[validate(length(min = 1, max = 200))]
    pub device_name: String,
    #[validate(length(min = 1, max = 100))]
    pub device_type: String,
    #[validate(length(min = 1, max = 200))]
    pub manufacturer: String,
    #[validate(length(min = 1, max = 200))]
    pub model: String,
    #[validate(length(min = 1, max = 100))]
    pub serial_number: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate]
    pub documents: Vec<DocumentRef>,
}

/// Backoffice decision on a pending submission
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReviewSubmissionRequest {
    pub status: SubmissionStatus,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

/// Query string for the backoffice listing
#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SubmissionListQuery {
    pub status: Option<SubmissionStatus>,
}

fn validate_json_object(value: &serde_json::Value) -> Result<(), ValidationError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(ValidationError::new("draft data must be a JSON object"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_email_validated() {
        let req = UpdateProfileRequest {
            email: Some("not-an-email".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_err());

        let req = UpdateProfileRequest {
            email: Some("owner@example.com".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_draft_data_must_be_object() {
        let req: SaveDraftRequest =
            serde_json::from_value(json!({ "currentStep": 2, "data": [1, 2] })).unwrap();
        assert!(req.validate().is_err());

        let req: SaveDraftRequest =
            serde_json::from_value(json!({ "currentStep": 2, "data": { "deviceName": "x" } }))
                .unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_submission_rejects_unknown_fields() {
        let result = serde_json::from_value::<CreateSubmissionRequest>(json!({
            "deviceName": "Sensor",
            "deviceType": "iot",
            "manufacturer": "Acme",
            "model": "S1",
            "serialNumber": "SN-1",
            "isAdmin": true
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_submission_validates_documents() {
        let req: CreateSubmissionRequest = serde_json::from_value(json!({
            "deviceName": "Sensor",
            "deviceType": "iot",
            "manufacturer": "Acme",
            "model": "S1",
            "serialNumber": "SN-1",
            "documents": [{ "name": "invoice.pdf", "url": "not a url", "contentType": "application/pdf" }]
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }
}
