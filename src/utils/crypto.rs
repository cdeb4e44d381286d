// src/utils/crypto.rs
//! Digest utilities for certificate hashing.
//!
//! Uses SHA-256 (via `ring`) for all content hashes. Hashes leave this module
//! as 64 lowercase hex characters.

use crate::models::certificate::CertificateFields;
use crate::utils::serialization::canonical_certificate_bytes;
use ring::digest::{digest, SHA256};

/// Length of a hex-encoded SHA-256 digest.
pub const HASH_HEX_LEN: usize = 64;

/// Computes a SHA-256 hash of the input data.
///
/// # Arguments
/// * `data` - Binary data to hash (as bytes slice)
///
/// # Returns
/// Fixed-size 32-byte array (`[u8; 32]`) containing the digest.
pub fn hash_data(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(digest(&SHA256, data).as_ref());
    out
}

/// SHA-256 of `data`, hex-encoded in lowercase.
pub fn hash_hex(data: &[u8]) -> String {
    hex::encode(hash_data(data))
}

/// Content hash of a certificate: SHA-256 over its canonical encoding.
///
/// Issuance stores this value and verification recomputes it, so the same
/// logical fields must always give the same 64-character hex string.
pub fn compute_hash(fields: &CertificateFields) -> String {
    hash_hex(&canonical_certificate_bytes(fields))
}

/// Returns `true` when `value` looks like a digest produced by [`hash_hex`].
pub fn is_hash_hex(value: &str) -> bool {
    value.len() == HASH_HEX_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
