//! Certificate request and verification DTOs

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Certificate;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenerateCertificateRequest {
    pub submission_id: Uuid,
}

/// Certificate metadata safe to show to anyone holding the id
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicCertificate {
    pub id: Uuid,
    pub device_name: String,
    pub manufacturer: String,
    pub model: String,
    /// Only the last four characters are kept
    pub serial_number: String,
    pub content_hash: String,
    pub issued_at: DateTime<Utc>,
}

impl From<&Certificate> for PublicCertificate {
    fn from(cert: &Certificate) -> Self {
        Self {
            id: cert.id,
            device_name: cert.device_name.clone(),
            manufacturer: cert.manufacturer.clone(),
            model: cert.model.clone(),
            serial_number: mask_serial(&cert.serial_number),
            content_hash: cert.content_hash.clone(),
            issued_at: cert.issued_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateVerification {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<PublicCertificate>,
}

fn mask_serial(serial: &str) -> String {
    let chars: Vec<char> = serial.chars().collect();
    let keep = chars.len().min(4);
    let hidden = chars.len() - keep;

    std::iter::repeat('*')
        .take(hidden)
        .chain(chars[hidden..].iter().copied())
        .collect()
}
