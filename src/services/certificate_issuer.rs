// src/services/certificate_issuer.rs
//! Certificate Issuer Service
//!
//! Runs the issuance workflow: validates the submitted fields, computes the
//! content hash and appends the certificate to the authoritative store.
//! Access control happens before this service is called.

use crate::error::{CertifyError, Result};
use crate::models::certificate::{CertificateFields, CertificateRecord};
use crate::storage::certificate_ledger::ID_PLACEHOLDER;
use crate::storage::certificate_store::CertificateStore;
use crate::utils::crypto::compute_hash;
use crate::utils::serialization::canonical_certificate_string;
use log::{debug, info};
use std::ops::RangeInclusive;
use std::sync::Arc;

/// Graduation years accepted at issuance.
pub const VALID_YEARS: RangeInclusive<u32> = 1900..=2100;

/// Human-readable description of the canonical hash input.
pub const CANONICAL_RULES: [&str; 4] = [
    "All text fields are trimmed of leading/trailing whitespace",
    "Fields are ordered: studentName, studentId, degree, year",
    "Data is serialized as compact JSON before hashing",
    "Hash algorithm: SHA-256, lowercase hex",
];

/// Service that issues certificates into the store.
#[derive(Clone)]
pub struct CertificateIssuer {
    store: Arc<dyn CertificateStore>,

    /// Base URL the public verification page is served from
    public_base_url: String,
}

impl CertificateIssuer {
    /// Creates a new CertificateIssuer instance
    ///
    /// # Arguments
    /// * `store` - Authoritative certificate store
    /// * `public_base_url` - Origin used to build verification links, e.g. "https://certify.example"
    pub fn new(store: Arc<dyn CertificateStore>, public_base_url: &str) -> Self {
        Self {
            store,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Public link that verifies certificate `id`; `{id}` yields a template
    /// the store fills in.
    fn verification_url(&self, id: &str) -> String {
        format!("{}/verify?certId={}", self.public_base_url, id)
    }

    /// Issues a new certificate.
    ///
    /// # Arguments
    /// * `issuer` - Principal credited with the issuance
    /// * `fields` - Certificate content as submitted
    ///
    /// # Returns
    /// The stored record, with trimmed fields, content hash, identifier,
    /// timestamp and verification URL filled in.
    ///
    /// # Errors
    /// - `InvalidInput` if a text field is blank or the year is out of range
    /// - store errors are propagated
    pub fn issue(&self, issuer: &str, fields: &CertificateFields) -> Result<CertificateRecord> {
        validate(fields)?;
        let fields = fields.trimmed();
        let hash = compute_hash(&fields);
        debug!("Canonical form: {}", canonical_certificate_string(&fields));

        let record = self.store.create(
            fields,
            hash,
            self.verification_url(ID_PLACEHOLDER),
            issuer.to_string(),
        )?;

        info!(
            "Issued certificate {} to student {} (hash {})",
            record.id, record.fields.student_id, record.hash
        );
        Ok(record)
    }
}

/// Rejects certificate data that must never reach the hashing core.
pub fn validate(fields: &CertificateFields) -> Result<()> {
    let required = [
        ("studentName", &fields.student_name),
        ("studentId", &fields.student_id),
        ("degree", &fields.degree),
    ];
    if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(CertifyError::InvalidInput(format!("{} is required", name)));
    }
    if !VALID_YEARS.contains(&fields.year) {
        return Err(CertifyError::InvalidInput(format!(
            "year must be between {} and {}",
            VALID_YEARS.start(),
            VALID_YEARS.end()
        )));
    }
    Ok(())
}
