// src/storage/snapshot.rs
//! JSON snapshot persistence for the certificate ledger.
//!
//! The whole ledger is written as one JSON document. Writes go to a sibling
//! temporary file first and are then renamed over the snapshot, so a crash
//! mid-write leaves the previous snapshot intact.

use crate::error::{CertifyError, Result};
use crate::models::certificate::CertificateRecord;
use crate::utils::serialization::{deserialize, serialize};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SnapshotDocument {
    version: u32,
    certificates: Vec<CertificateRecord>,
}

/// File-backed snapshot of every issued certificate.
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    path: PathBuf,
}

impl LedgerSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all records from the snapshot.
    ///
    /// A missing file is an empty ledger. An unreadable or unknown-version
    /// file is reported as `Unavailable`.
    pub fn load(&self) -> Result<Vec<CertificateRecord>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(CertifyError::Unavailable(format!(
                    "cannot read ledger snapshot {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        let document: SnapshotDocument = deserialize(&raw).map_err(|e| {
            CertifyError::Unavailable(format!(
                "corrupt ledger snapshot {}: {}",
                self.path.display(),
                e
            ))
        })?;
        if document.version != SNAPSHOT_VERSION {
            return Err(CertifyError::Unavailable(format!(
                "unsupported ledger snapshot version {}",
                document.version
            )));
        }
        Ok(document.certificates)
    }

    /// Replaces the snapshot with `records`.
    pub fn save(&self, records: &[CertificateRecord]) -> Result<()> {
        let document = SnapshotDocument {
            version: SNAPSHOT_VERSION,
            certificates: records.to_vec(),
        };
        let json = serialize(&document)?;
        write_atomically(&self.path, &json).map_err(|e| {
            CertifyError::Unavailable(format!(
                "cannot write ledger snapshot {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

/// Writes `contents` to a sibling `.tmp` file, then renames it over `path`.
pub(crate) fn write_atomically(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}
