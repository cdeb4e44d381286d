// src/services/verifier.rs
//! Certificate verification service.
//!
//! Looks a certificate up in the store and classifies the attempt as
//! `valid`, `invalid` or `not-found`. When the caller supplies the fields it
//! claims are on the certificate, their hash is recomputed and compared with
//! the one recorded at issuance.

use crate::error::Result;
use crate::models::certificate::{
    CertificateFields, CertificateRecord, LookupKey, VerificationResult, VerificationStatus,
};
use crate::storage::certificate_store::CertificateStore;
use crate::utils::crypto::compute_hash;
use log::{debug, info};
use std::sync::Arc;

/// Certificate verifier backed by the authoritative store.
///
/// Holds no state besides the store handle, so one instance can serve any
/// number of concurrent requests.
#[derive(Clone)]
pub struct Verifier {
    store: Arc<dyn CertificateStore>,
}

impl Verifier {
    pub fn new(store: Arc<dyn CertificateStore>) -> Self {
        Self { store }
    }

    /// Verifies a certificate.
    ///
    /// # Arguments
    /// * `lookup` - Identifier or student id of the certificate on file
    /// * `claimed` - Fields to cross-check against the stored hash, if any
    ///
    /// # Returns
    /// - `not-found` when no record matches `lookup`
    /// - `valid` when a record exists and either nothing was claimed or the
    ///   claimed fields hash to the stored value
    /// - `invalid` when the claimed fields hash to something else
    ///
    /// The matched record is returned for `valid` and `invalid` alike.
    ///
    /// # Errors
    /// Store faults are propagated unchanged; they are never turned into a
    /// `not-found` outcome.
    pub fn verify(
        &self,
        lookup: &LookupKey,
        claimed: Option<&CertificateFields>,
    ) -> Result<VerificationResult> {
        let claimed_hash = claimed.map(compute_hash);
        let record = self.find(lookup, claimed_hash.as_deref())?;

        let status = match (&record, &claimed_hash) {
            (None, _) => VerificationStatus::NotFound,
            (Some(_), None) => VerificationStatus::Valid,
            (Some(record), Some(hash)) if record.hash == *hash => VerificationStatus::Valid,
            (Some(_), Some(_)) => VerificationStatus::Invalid,
        };

        if let Some(hash) = &claimed_hash {
            debug!("Claimed certificate hash for {:?}: {}", lookup, hash);
        }
        info!("Verification of {:?}: {:?}", lookup, status);

        Ok(VerificationResult::new(status, record, new_verification_id()))
    }

    /// Resolves the record to verify against.
    ///
    /// A student id may match several certificates. The one whose hash equals
    /// the claimed hash wins; otherwise the most recently issued one is used.
    fn find(&self, lookup: &LookupKey, claimed_hash: Option<&str>) -> Result<Option<CertificateRecord>> {
        match lookup {
            LookupKey::Id(id) => self.store.get(*id),
            LookupKey::StudentId(student_id) => {
                let mut records = self.store.get_by_student_id(student_id)?;
                let matching = claimed_hash
                    .and_then(|hash| records.iter().position(|r| r.hash == hash));
                Ok(match matching {
                    Some(index) => Some(records.swap_remove(index)),
                    None => records.pop(),
                })
            }
        }
    }
}

/// Opaque correlation token shown to the user with a verification result.
fn new_verification_id() -> String {
    format!("ver-{:016x}", rand::random::<u64>())
}
