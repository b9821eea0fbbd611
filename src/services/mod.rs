//! Business logic services for DeviceVault

mod certificate;
mod intake;

pub use certificate::{content_hash, CertificateService};
pub use intake::IntakeService;
