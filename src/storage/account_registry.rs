// src/storage/account_registry.rs
//! Role assignments and caller profiles.
//!
//! Keyed by principal (trimmed, lowercased). Kept in memory and optionally
//! mirrored to a JSON file next to the ledger snapshot, using the same
//! write-then-rename scheme.

use crate::error::{CertifyError, Result};
use crate::models::user::{UserProfile, UserRole};
use crate::storage::snapshot::write_atomically;
use crate::utils::serialization::{deserialize, serialize};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Accounts {
    roles: HashMap<String, UserRole>,
    profiles: HashMap<String, UserProfile>,
}

/// Thread-safe registry of assigned roles and saved profiles.
///
/// Cloning is cheap and every clone shares the same accounts.
#[derive(Clone, Default)]
pub struct AccountRegistry {
    accounts: Arc<RwLock<Accounts>>,
    path: Option<PathBuf>,
}

/// Canonical registry key for a principal.
fn principal_key(principal: &str) -> Result<String> {
    let key = principal.trim().to_lowercase();
    if key.is_empty() {
        return Err(CertifyError::InvalidInput("principal is required".into()));
    }
    Ok(key)
}

impl AccountRegistry {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens a registry persisted to `path`. A missing file is an empty registry.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let accounts = match fs::read_to_string(&path) {
            Ok(raw) => deserialize::<Accounts>(&raw).map_err(|e| {
                CertifyError::Unavailable(format!("corrupt account file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Accounts::default(),
            Err(e) => {
                return Err(CertifyError::Unavailable(format!(
                    "cannot read account file {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        info!(
            "Loaded {} role assignment(s) and {} profile(s) from {}",
            accounts.roles.len(),
            accounts.profiles.len(),
            path.display()
        );
        Ok(Self {
            accounts: Arc::new(RwLock::new(accounts)),
            path: Some(path),
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Accounts>> {
        self.accounts
            .read()
            .map_err(|_| CertifyError::Unavailable("account registry lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Accounts>> {
        self.accounts
            .write()
            .map_err(|_| CertifyError::Unavailable("account registry lock poisoned".into()))
    }

    /// Applies `change` and persists the result; the change is undone if
    /// the file cannot be written.
    fn update(&self, change: impl FnOnce(&mut Accounts)) -> Result<()> {
        let mut accounts = self.write()?;
        let previous = accounts.clone();
        change(&mut accounts);

        if let Some(path) = &self.path {
            let persisted = serialize(&*accounts).map_err(CertifyError::from).and_then(|json| {
                write_atomically(path, &json).map_err(|e| {
                    CertifyError::Unavailable(format!(
                        "cannot write account file {}: {}",
                        path.display(),
                        e
                    ))
                })
            });
            if let Err(e) = persisted {
                error!("Account change not persisted, rolling back: {}", e);
                *accounts = previous;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Role assigned to `principal`, if any.
    pub fn role(&self, principal: &str) -> Result<Option<UserRole>> {
        let key = principal_key(principal)?;
        Ok(self.read()?.roles.get(&key).copied())
    }

    /// Assigns `role` to `principal`. Assigning `Guest` revokes any role.
    pub fn assign_role(&self, principal: &str, role: UserRole) -> Result<()> {
        let key = principal_key(principal)?;
        self.update(|accounts| match role {
            UserRole::Guest => {
                accounts.roles.remove(&key);
            }
            role => {
                accounts.roles.insert(key, role);
            }
        })
    }

    pub fn profile(&self, principal: &str) -> Result<Option<UserProfile>> {
        let key = principal_key(principal)?;
        Ok(self.read()?.profiles.get(&key).cloned())
    }

    /// Saves the profile of `principal`, replacing any earlier one.
    ///
    /// # Errors
    /// `InvalidInput` when the name is blank.
    pub fn save_profile(&self, principal: &str, profile: &UserProfile) -> Result<UserProfile> {
        let key = principal_key(principal)?;
        let profile = profile.trimmed();
        if profile.name.is_empty() {
            return Err(CertifyError::InvalidInput("name is required".into()));
        }
        let saved = profile.clone();
        self.update(|accounts| {
            accounts.profiles.insert(key, profile);
        })?;
        Ok(saved)
    }
}
