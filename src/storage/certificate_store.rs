// src/storage/certificate_store.rs
//! The authoritative certificate store.
//!
//! [`CertificateStore`] is the boundary the hashing core and the issuance
//! workflow talk to. [`LedgerStore`] implements it over a shared
//! [`CertificateLedger`], optionally mirrored to a JSON snapshot on disk.

use crate::error::{CertifyError, Result};
use crate::models::certificate::{CertificateFields, CertificateHistory, CertificateRecord};
use crate::storage::certificate_ledger::CertificateLedger;
use crate::storage::snapshot::LedgerSnapshot;
use log::{error, info};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Storage collaborator for issued certificates.
///
/// Implementations must be append-only: `create` assigns the identifier and
/// timestamp, and no operation modifies an existing record.
pub trait CertificateStore: Send + Sync {
    /// Looks a certificate up by identifier.
    fn get(&self, id: u64) -> Result<Option<CertificateRecord>>;

    /// All certificates issued to a student, oldest first.
    fn get_by_student_id(&self, student_id: &str) -> Result<Vec<CertificateRecord>>;

    /// Records a newly issued certificate.
    ///
    /// `url` may contain `{id}`, which is replaced with the assigned identifier.
    fn create(
        &self,
        fields: CertificateFields,
        hash: String,
        url: String,
        issuer: String,
    ) -> Result<CertificateRecord>;

    /// One page of issuance history, newest first.
    fn history(&self, page_index: usize, page_size: usize) -> Result<CertificateHistory>;

    fn count(&self) -> Result<usize>;
}

/// Thread-safe [`CertificateStore`] backed by an in-memory ledger.
///
/// Cloning is cheap and every clone shares the same ledger.
#[derive(Clone, Default)]
pub struct LedgerStore {
    ledger: Arc<RwLock<CertificateLedger>>,
    snapshot: Option<LedgerSnapshot>,
}

impl LedgerStore {
    /// Creates a store that keeps certificates in memory only.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens a store persisted to `snapshot`, loading any existing records.
    ///
    /// Every `create` rewrites the whole snapshot while holding the write
    /// lock, so issuance cost grows linearly with the number of certificates
    /// and concurrent readers wait for the write to finish.
    pub fn open(snapshot: LedgerSnapshot) -> Result<Self> {
        let ledger = CertificateLedger::from_records(snapshot.load()?)?;
        info!(
            "Loaded {} certificate(s) from {}",
            ledger.count(),
            snapshot.path().display()
        );
        Ok(Self {
            ledger: Arc::new(RwLock::new(ledger)),
            snapshot: Some(snapshot),
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, CertificateLedger>> {
        self.ledger
            .read()
            .map_err(|_| CertifyError::Unavailable("certificate ledger lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, CertificateLedger>> {
        self.ledger
            .write()
            .map_err(|_| CertifyError::Unavailable("certificate ledger lock poisoned".into()))
    }
}

impl CertificateStore for LedgerStore {
    fn get(&self, id: u64) -> Result<Option<CertificateRecord>> {
        Ok(self.read()?.get(id).cloned())
    }

    fn get_by_student_id(&self, student_id: &str) -> Result<Vec<CertificateRecord>> {
        Ok(self
            .read()?
            .get_by_student_id(student_id)
            .into_iter()
            .cloned()
            .collect())
    }

    fn create(
        &self,
        fields: CertificateFields,
        hash: String,
        url: String,
        issuer: String,
    ) -> Result<CertificateRecord> {
        let issued_at = chrono::Utc::now()
            .timestamp_nanos_opt()
            .ok_or_else(|| CertifyError::Unavailable("system clock out of range".into()))?;

        let mut ledger = self.write()?;
        let record = ledger.append(fields, hash, &url, issuer, issued_at);

        if let Some(snapshot) = &self.snapshot {
            if let Err(e) = snapshot.save(ledger.records()) {
                error!("Certificate {} not persisted, rolling back: {}", record.id, e);
                ledger.rollback_last();
                return Err(e);
            }
        }
        Ok(record)
    }

    fn history(&self, page_index: usize, page_size: usize) -> Result<CertificateHistory> {
        let ledger = self.read()?;
        Ok(CertificateHistory {
            certificates: ledger.page(page_index, page_size).into_iter().cloned().collect(),
            page_index,
            page_size,
            total_certificates: ledger.count(),
        })
    }

    fn count(&self) -> Result<usize> {
        Ok(self.read()?.count())
    }
}
