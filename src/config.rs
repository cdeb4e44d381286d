// src/config.rs
//! Runtime configuration.
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `certify.toml` in the working directory, then `CERTIFY_*` environment
//! variables (e.g. `CERTIFY_BIND_ADDRESS`, `CERTIFY_LEDGER_PATH`).

use crate::error::Result;
use ::config::builder::{ConfigBuilder, DefaultState};
use log::warn;
use serde::Deserialize;
use std::net::SocketAddr;

pub const DEFAULT_JWT_SECRET: &str = "change-me";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub bind_address: SocketAddr,
    /// Origin of the public verification page, used in certificate links
    pub public_base_url: String,
    pub jwt_secret: String,
    pub admin_email: String,
    pub admin_password: String,
    pub token_ttl_secs: i64,
    /// Snapshot file for the certificate ledger; memory only when unset
    pub ledger_path: Option<String>,
    /// File for role assignments and profiles; memory only when unset
    pub accounts_path: Option<String>,
}

/// Built-in defaults, the bottom configuration layer.
fn defaults() -> Result<ConfigBuilder<DefaultState>> {
    Ok(::config::Config::builder()
        .set_default("bind_address", "127.0.0.1:5000")?
        .set_default("public_base_url", "http://localhost:5000")?
        .set_default("jwt_secret", DEFAULT_JWT_SECRET)?
        .set_default("admin_email", "admin@certify.com")?
        .set_default("admin_password", DEFAULT_ADMIN_PASSWORD)?
        .set_default("token_ttl_secs", 3600)?)
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let settings = defaults()?
            .add_source(::config::File::with_name("certify").required(false))
            .add_source(::config::Environment::with_prefix("CERTIFY").try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Logs a warning for every setting still at an insecure default.
    pub fn warn_insecure_defaults(&self) {
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("CERTIFY_JWT_SECRET is not set; session tokens use the development secret");
        }
        if self.admin_password == DEFAULT_ADMIN_PASSWORD {
            warn!("CERTIFY_ADMIN_PASSWORD is not set; admin login uses the development password");
        }
    }
}
