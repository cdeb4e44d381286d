// src/utils/serialization.rs
//! Serialization utilities for the certificate service.
//!
//! Provides:
//! - The canonical byte encoding of certificate fields used as hash input
//! - JSON helpers for ledger snapshots

use crate::models::certificate::CertificateFields;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Produces the canonical byte sequence of a certificate's fields.
///
/// The encoding is compact JSON with a fixed key order:
/// ```text
/// {"studentName":<string>,"studentId":<string>,"degree":<string>,"year":<integer>}
/// ```
/// Every text field is trimmed first. Strings are escaped with serde_json's
/// string encoder, the year is written in base 10, and no whitespace is
/// emitted between tokens. Keys are written explicitly rather than through a
/// map serializer, so the output never depends on map ordering.
///
/// No validation happens here: empty strings are encoded as `""`.
pub fn canonical_certificate_bytes(fields: &CertificateFields) -> Vec<u8> {
    canonical_certificate_string(fields).into_bytes()
}

/// [`canonical_certificate_bytes`] as a `String`, for display and logging.
pub fn canonical_certificate_string(fields: &CertificateFields) -> String {
    format!(
        "{{\"studentName\":{},\"studentId\":{},\"degree\":{},\"year\":{}}}",
        json_string(fields.student_name.trim()),
        json_string(fields.student_id.trim()),
        json_string(fields.degree.trim()),
        fields.year,
    )
}

// Display for Value::String is infallible and yields a quoted, escaped literal.
fn json_string(s: &str) -> String {
    Value::String(s.to_owned()).to_string()
}

/// Serializes a value to a JSON string.
///
/// # Returns
/// - `Ok(String)` with JSON representation on success
/// - `Err(serde_json::Error)` if serialization fails
pub fn serialize<T: Serialize>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(data)
}

/// Deserializes a value from a JSON string.
pub fn deserialize<'a, T: Deserialize<'a>>(data: &'a str) -> Result<T, serde_json::Error> {
    serde_json::from_str(data)
}
