// src/main.rs

//! # Certificate Ledger - Main Entry Point
//!
//! Issues academic certificates whose content hash is recorded at issuance and
//! re-derived at verification time to detect tampering.
//!
//! ## Architecture Overview
//! 1. **Hashing Layer**: canonical encoding of certificate fields + SHA-256
//! 2. **Storage Layer**: append-only certificate ledger, optionally snapshotted to disk
//! 3. **Services Layer**: issuance, verification, access control and the HTTP API
//!
//! ## Environment Variables
//! - `CERTIFY_BIND_ADDRESS`: listen address (default: 127.0.0.1:5000)
//! - `CERTIFY_PUBLIC_BASE_URL`: origin used in verification links
//! - `CERTIFY_JWT_SECRET`: secret for admin session tokens
//! - `CERTIFY_ADMIN_EMAIL` / `CERTIFY_ADMIN_PASSWORD`: admin credentials
//! - `CERTIFY_LEDGER_PATH`: (Optional) JSON snapshot file for the ledger
//! - `CERTIFY_ACCOUNTS_PATH`: (Optional) JSON file for roles and profiles
//! - `RUST_LOG`: log filter (default: info)

use crate::config::AppConfig;
use crate::services::access_control::AccessControl;
use crate::services::api_server::ApiServer;
use crate::services::certificate_issuer::CertificateIssuer;
use crate::services::verifier::Verifier;
use crate::storage::account_registry::AccountRegistry;
use crate::storage::certificate_store::{CertificateStore, LedgerStore};
use crate::storage::snapshot::LedgerSnapshot;
use dotenv::dotenv;
use log::info;
use std::sync::Arc;

// Module declarations (organized by functional domain)
mod config;        // Layered runtime configuration
mod error;         // Error classification
mod models;        // Data structures
mod services;      // Business logic and API
mod storage;       // Certificate ledger and persistence
mod utils;         // Canonical encoding and hashing

/// Main application entry point
///
/// # Initialization Sequence
/// 1. Load environment and configuration
/// 2. Open the certificate store
/// 3. Initialize service components
/// 4. Start API server
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load()?;
    config.warn_insecure_defaults();

    let store: Arc<dyn CertificateStore> = match &config.ledger_path {
        Some(path) => Arc::new(LedgerStore::open(LedgerSnapshot::new(path))?),
        None => {
            info!("No ledger path configured; certificates are kept in memory only");
            Arc::new(LedgerStore::in_memory())
        }
    };

    let accounts = match &config.accounts_path {
        Some(path) => AccountRegistry::open(path)?,
        None => AccountRegistry::in_memory(),
    };

    let certificate_issuer = CertificateIssuer::new(store.clone(), &config.public_base_url);
    let verifier = Verifier::new(store.clone());
    let access_control = AccessControl::new(
        &config.jwt_secret,
        &config.admin_email,
        &config.admin_password,
        config.token_ttl_secs,
        accounts.clone(),
    );

    let api_server = ApiServer::new(certificate_issuer, verifier, access_control, store, accounts);
    api_server.run(config.bind_address).await?;
    Ok(())
}
