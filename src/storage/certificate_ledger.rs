// src/storage/certificate_ledger.rs
//! Append-only certificate ledger.
//!
//! Keeps every issued [`CertificateRecord`] in issuance order together with a
//! secondary index by student id. The ledger is a plain single-threaded value;
//! [`LedgerStore`](crate::storage::certificate_store::LedgerStore) adds locking
//! and persistence on top.

use crate::error::{CertifyError, Result};
use crate::models::certificate::{CertificateFields, CertificateRecord};
use crate::utils::crypto::is_hash_hex;
use std::collections::HashMap;

/// Placeholder substituted with the assigned identifier in certificate URLs.
pub const ID_PLACEHOLDER: &str = "{id}";

/// In-memory, append-only list of issued certificates.
///
/// Invariants:
/// - record `n` (zero based) has id `n + 1`
/// - records are never modified or removed once appended
#[derive(Debug, Default, Clone)]
pub struct CertificateLedger {
    records: Vec<CertificateRecord>,
    by_student: HashMap<String, Vec<u64>>,
}

impl CertificateLedger {
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger from previously persisted records.
    ///
    /// # Errors
    /// `Unavailable` if the ids are not exactly `1..=n` in order or a stored
    /// hash is not a lowercase SHA-256 hex digest. Either means the snapshot
    /// was altered outside the service.
    pub fn from_records(records: Vec<CertificateRecord>) -> Result<Self> {
        let mut ledger = Self::new();
        for (position, record) in records.into_iter().enumerate() {
            let expected = position as u64 + 1;
            if record.id != expected {
                return Err(CertifyError::Unavailable(format!(
                    "ledger snapshot out of sequence: expected id {}, found {}",
                    expected, record.id
                )));
            }
            if !is_hash_hex(&record.hash) {
                return Err(CertifyError::Unavailable(format!(
                    "ledger snapshot has malformed hash for certificate {}",
                    record.id
                )));
            }
            ledger.index(&record);
            ledger.records.push(record);
        }
        Ok(ledger)
    }

    /// Identifier the next appended certificate will receive.
    pub fn next_id(&self) -> u64 {
        self.records.len() as u64 + 1
    }

    /// Appends a new certificate and returns the stored record.
    ///
    /// Every `{id}` in `url_template` is replaced with the assigned identifier.
    pub fn append(
        &mut self,
        fields: CertificateFields,
        hash: String,
        url_template: &str,
        issuer: String,
        issued_at: i64,
    ) -> CertificateRecord {
        let id = self.next_id();
        let record = CertificateRecord {
            id,
            fields,
            issuer,
            issued_at,
            hash,
            certificate_url: url_template.replace(ID_PLACEHOLDER, &id.to_string()),
        };
        self.index(&record);
        self.records.push(record.clone());
        record
    }

    /// Undoes the most recent [`append`](Self::append). Used only when the
    /// append could not be made durable.
    pub(crate) fn rollback_last(&mut self) {
        if let Some(record) = self.records.pop() {
            let key = record.fields.student_id.trim().to_string();
            if let Some(ids) = self.by_student.get_mut(&key) {
                ids.retain(|id| *id != record.id);
                if ids.is_empty() {
                    self.by_student.remove(&key);
                }
            }
        }
    }

    /// Retrieves a certificate by its identifier.
    pub fn get(&self, id: u64) -> Option<&CertificateRecord> {
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        self.records.get(index)
    }

    /// All certificates issued to `student_id`, oldest first.
    ///
    /// The lookup key is trimmed before matching.
    pub fn get_by_student_id(&self, student_id: &str) -> Vec<&CertificateRecord> {
        self.by_student
            .get(student_id.trim())
            .map(|ids| ids.iter().filter_map(|id| self.get(*id)).collect())
            .unwrap_or_default()
    }

    /// Returns the number of issued certificates.
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// One page of certificates, newest first.
    pub fn page(&self, page_index: usize, page_size: usize) -> Vec<&CertificateRecord> {
        self.records
            .iter()
            .rev()
            .skip(page_index.saturating_mul(page_size))
            .take(page_size)
            .collect()
    }

    pub fn records(&self) -> &[CertificateRecord] {
        &self.records
    }

    fn index(&mut self, record: &CertificateRecord) {
        self.by_student
            .entry(record.fields.student_id.trim().to_string())
            .or_default()
            .push(record.id);
    }
}
