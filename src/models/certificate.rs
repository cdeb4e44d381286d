// src/models/certificate.rs
//! Certificate data model.
//!
//! Defines the fields an issuer supplies, the immutable record the store keeps,
//! and the tri-state result handed back by verification. All types serialize
//! with camelCase keys so the JSON wire form matches the public API.

use serde::{Deserialize, Serialize};

/// The certificate content that is hashed.
///
/// Text fields are trimmed before hashing or comparison; see
/// [`canonical_certificate_bytes`](crate::utils::serialization::canonical_certificate_bytes).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CertificateFields {
    /// Example: "John Doe"
    pub student_name: String,
    /// Example: "STU123456"
    pub student_id: String,
    /// Example: "Bachelor of Computer Science"
    pub degree: String,
    /// Graduation year, e.g. 2024
    pub year: u32,
}

impl CertificateFields {
    pub fn new(
        student_name: impl Into<String>,
        student_id: impl Into<String>,
        degree: impl Into<String>,
        year: u32,
    ) -> Self {
        Self {
            student_name: student_name.into(),
            student_id: student_id.into(),
            degree: degree.into(),
            year,
        }
    }

    /// Copy of the fields with surrounding whitespace removed from every text field.
    pub fn trimmed(&self) -> Self {
        Self {
            student_name: self.student_name.trim().to_string(),
            student_id: self.student_id.trim().to_string(),
            degree: self.degree.trim().to_string(),
            year: self.year,
        }
    }
}

/// An issued certificate as kept by the store.
///
/// Records are created exactly once and never mutated afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRecord {
    /// Identifier assigned by the store, starting at 1
    pub id: u64,
    #[serde(flatten)]
    pub fields: CertificateFields,
    /// Principal credited with issuing the certificate
    pub issuer: String,
    /// Issuance time in nanoseconds since the Unix epoch
    pub issued_at: i64,
    /// Lowercase hex SHA-256 of the canonical fields
    pub hash: String,
    /// Public verification link
    pub certificate_url: String,
}

/// Tri-state classification of a verification attempt.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationStatus {
    Valid,
    Invalid,
    NotFound,
}

impl VerificationStatus {
    pub fn is_valid(self) -> bool {
        matches!(self, VerificationStatus::Valid)
    }
}

/// Outcome of a single verification request. Never persisted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub is_valid: bool,
    pub status: VerificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificateRecord>,
    /// Opaque correlation token for display; carries no security meaning
    pub verification_id: String,
}

impl VerificationResult {
    pub fn new(
        status: VerificationStatus,
        certificate: Option<CertificateRecord>,
        verification_id: String,
    ) -> Self {
        Self {
            is_valid: status.is_valid(),
            status,
            certificate,
            verification_id,
        }
    }
}

/// How a verifier locates the record to check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    Id(u64),
    StudentId(String),
}

/// One page of the issuance history, newest certificates first.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CertificateHistory {
    pub certificates: Vec<CertificateRecord>,
    pub page_index: usize,
    pub page_size: usize,
    pub total_certificates: usize,
}
