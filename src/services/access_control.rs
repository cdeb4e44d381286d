// src/services/access_control.rs
//! Session tokens and role checks for the certificate service.
//!
//! Admins log in with the configured credentials and receive an HS256 JWT.
//! Requests that issue certificates present that token and must resolve to an
//! admin [`Caller`]. Admins assign roles to other principals, which hands out
//! a token for that principal. Verification and lookups need no token.
//!
//! The role in a token is only a hint: every request re-reads the principal's
//! current role from the [`AccountRegistry`], so a revoked role takes effect
//! immediately.

use crate::error::{CertifyError, Result};
use crate::models::user::{Caller, UserRole};
use crate::storage::account_registry::AccountRegistry;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// JWT body minted at login.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: UserRole,
    exp: usize,
}

/// Issues and checks session tokens.
#[derive(Clone)]
pub struct AccessControl {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    admin_email: String,
    admin_password: String,
    token_ttl_secs: i64,
    accounts: AccountRegistry,
}

impl AccessControl {
    pub fn new(
        jwt_secret: &str,
        admin_email: &str,
        admin_password: &str,
        token_ttl_secs: i64,
        accounts: AccountRegistry,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            admin_email: admin_email.trim().to_lowercase(),
            admin_password: admin_password.to_string(),
            token_ttl_secs,
            accounts,
        }
    }

    /// Exchanges admin credentials for a session token.
    ///
    /// # Errors
    /// `Unauthorized` when the credentials do not match.
    pub fn login(&self, email: &str, password: &str) -> Result<String> {
        let email = email.trim().to_lowercase();
        if email != self.admin_email || password != self.admin_password {
            warn!("Rejected login for {}", email);
            return Err(CertifyError::Unauthorized("invalid credentials".into()));
        }
        let token = self.mint(&email, UserRole::Admin)?;
        info!("Admin {} logged in", email);
        Ok(token)
    }

    fn mint(&self, principal: &str, role: UserRole) -> Result<String> {
        let exp = chrono::Utc::now().timestamp() + self.token_ttl_secs;
        let claims = Claims {
            sub: principal.to_string(),
            role,
            exp: exp.max(0) as usize,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Resolves a bearer token to the caller it was minted for.
    ///
    /// The configured admin is always `Admin`; anyone else holds the role
    /// currently assigned to them, or `Guest` if none is.
    ///
    /// # Errors
    /// `Unauthorized` for a malformed, forged or expired token.
    pub fn authorize(&self, token: &str) -> Result<Caller> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map_err(|e| CertifyError::Unauthorized(format!("invalid session token: {}", e)))?;
        let principal = data.claims.sub;
        let role = if principal == self.admin_email {
            UserRole::Admin
        } else {
            self.accounts.role(&principal)?.unwrap_or(UserRole::Guest)
        };
        Ok(Caller { principal, role })
    }

    /// Capability check performed before issuance.
    pub fn require_admin(&self, token: Option<&str>) -> Result<Caller> {
        let token = token.ok_or_else(|| CertifyError::Unauthorized("missing session token".into()))?;
        let caller = self.authorize(token)?;
        if !caller.is_admin() {
            return Err(CertifyError::Forbidden(format!(
                "{} may not issue certificates",
                caller.principal
            )));
        }
        Ok(caller)
    }

    /// Requires a caller holding a role, for operations on their own account.
    ///
    /// # Errors
    /// `Unauthorized` without a valid token, `Forbidden` for a revoked role.
    pub fn require_member(&self, token: Option<&str>) -> Result<Caller> {
        let token = token.ok_or_else(|| CertifyError::Unauthorized("missing session token".into()))?;
        let caller = self.authorize(token)?;
        if caller.role == UserRole::Guest {
            return Err(CertifyError::Forbidden(format!(
                "{} has no assigned role",
                caller.principal
            )));
        }
        Ok(caller)
    }

    /// Role of whoever holds `token`; anyone without a valid token is a guest.
    pub fn caller_role(&self, token: Option<&str>) -> UserRole {
        token
            .and_then(|t| self.authorize(t).ok())
            .map(|caller| caller.role)
            .unwrap_or(UserRole::Guest)
    }

    pub fn is_admin(&self, token: Option<&str>) -> bool {
        self.caller_role(token) == UserRole::Admin
    }

    /// Assigns `role` to `principal` on behalf of `admin`.
    ///
    /// Returns a session token for the principal unless the role was revoked
    /// by assigning `Guest`.
    ///
    /// # Errors
    /// - `InvalidInput` for a blank principal or the configured admin, whose
    ///   role is fixed
    /// - registry errors are propagated
    pub fn assign_role(&self, admin: &Caller, principal: &str, role: UserRole) -> Result<Option<String>> {
        let principal = principal.trim().to_lowercase();
        if principal == self.admin_email {
            return Err(CertifyError::InvalidInput(
                "the configured admin's role cannot be changed".into(),
            ));
        }
        self.accounts.assign_role(&principal, role)?;
        info!("{} assigned role {:?} to {}", admin.principal, role, principal);
        match role {
            UserRole::Guest => Ok(None),
            role => Ok(Some(self.mint(&principal, role)?)),
        }
    }
}
