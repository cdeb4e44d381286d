// src/error.rs
//! Error classification shared by every layer of the certificate service.
//!
//! Verification outcomes (`invalid`, `not-found`) are *not* errors; they are
//! reported as data in [`VerificationResult`](crate::models::certificate::VerificationResult).
//! The variants here cover rejected input, access control, and store faults.

#[derive(Debug, thiserror::Error)]
pub enum CertifyError {
    /// Caller supplied malformed certificate data (empty field, bad year, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// The certificate store could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("config: {0}")]
    Config(#[from] ::config::ConfigError),
    #[error("token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

pub type Result<T, E = CertifyError> = std::result::Result<T, E>;
