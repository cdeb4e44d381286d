// src/models/user.rs
//! Caller identity model used by the access-control layer.

use serde::{Deserialize, Serialize};

/// Role held by a caller.
///
/// Only `Admin` may issue certificates or assign roles. `User` may keep a
/// profile. Callers without a valid token, or whose role was revoked, are
/// treated as `Guest`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
    Guest,
}

/// An authenticated caller, derived from a verified session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Principal the token was minted for (the admin e-mail for admin logins)
    pub principal: String,
    pub role: UserRole,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Profile a caller keeps about themselves.
///
/// A student links their profile to a student id to list the certificates
/// issued to them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Display name, e.g. "Ada Lovelace"
    pub name: String,
    /// Example: "STU123456"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
}

impl UserProfile {
    /// Copy with trimmed text; a blank student id becomes `None`.
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            student_id: self
                .student_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
        }
    }
}
