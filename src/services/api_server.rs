// src/services/api_server.rs
//! API Server for the certificate service
//!
//! REST interface over issuance, lookup and verification. Built with Axum;
//! every body is JSON with camelCase keys.
//!
//! Endpoints:
//! - Health and admin login
//! - Hash computation and canonicalization rules
//! - Certificate issuance (admin only), lookup and history
//! - Tri-state verification, optionally against claimed fields
//! - Role assignment (admin only) and per-caller profiles

use crate::error::{CertifyError, Result};
use crate::models::certificate::{
    CertificateFields, CertificateHistory, CertificateRecord, LookupKey, VerificationResult,
};
use crate::models::user::{UserProfile, UserRole};
use crate::services::access_control::AccessControl;
use crate::services::certificate_issuer::{CertificateIssuer, CANONICAL_RULES};
use crate::services::verifier::Verifier;
use crate::storage::account_registry::AccountRegistry;
use crate::storage::certificate_store::CertificateStore;
use crate::utils::crypto::compute_hash;
use crate::utils::serialization::canonical_certificate_string;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Json, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

// API request and response structures

/// Request payload for admin login
#[derive(Serialize, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

/// Response containing a session token
#[derive(Serialize, Deserialize)]
struct LoginResponse {
    token: String,
    role: UserRole,
}

#[derive(Serialize, Deserialize)]
struct CallerRoleResponse {
    role: UserRole,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IsAdminResponse {
    is_admin: bool,
}

/// Request payload for role assignment
#[derive(Serialize, Deserialize)]
struct AssignRoleRequest {
    principal: String,
    role: UserRole,
}

/// Response to role assignment; `token` is absent when the role was revoked
#[derive(Serialize, Deserialize)]
struct AssignRoleResponse {
    principal: String,
    role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

/// Response for hash computation
#[derive(Serialize, Deserialize)]
struct ComputeHashResponse {
    hash: String,
    canonical: String,
}

#[derive(Serialize, Deserialize)]
struct CanonicalRulesResponse {
    rules: Vec<String>,
}

/// Request payload for verification.
///
/// `certificateId` wins over `studentId` when both are present.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyCertificateRequest {
    certificate_id: Option<u64>,
    student_id: Option<String>,
    claimed: Option<CertificateFields>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryQuery {
    page_index: Option<usize>,
    page_size: Option<usize>,
}

/// JSON body extractor; malformed bodies are rejected as `InvalidInput`.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(CertifyError))]
struct ApiJson<T>(T);

impl From<JsonRejection> for CertifyError {
    fn from(rejection: JsonRejection) -> Self {
        CertifyError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for CertifyError {
    fn into_response(self) -> Response {
        let status = match &self {
            CertifyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CertifyError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            CertifyError::Forbidden(_) => StatusCode::FORBIDDEN,
            CertifyError::NotFound(_) => StatusCode::NOT_FOUND,
            CertifyError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// API server state containing all service dependencies
#[derive(Clone)]
pub struct ApiServer {
    /// Service for issuing certificates
    certificate_issuer: Arc<CertificateIssuer>,

    /// Service for verifying certificates
    verifier: Arc<Verifier>,

    /// Session tokens and role checks
    access_control: Arc<AccessControl>,

    /// Authoritative certificate store, for lookups and history
    store: Arc<dyn CertificateStore>,

    /// Caller profiles
    accounts: AccountRegistry,
}

impl ApiServer {
    /// Creates a new instance of the API server
    pub fn new(
        certificate_issuer: CertificateIssuer,
        verifier: Verifier,
        access_control: AccessControl,
        store: Arc<dyn CertificateStore>,
        accounts: AccountRegistry,
    ) -> Self {
        ApiServer {
            certificate_issuer: Arc::new(certificate_issuer),
            verifier: Arc::new(verifier),
            access_control: Arc::new(access_control),
            store,
            accounts,
        }
    }

    /// Configures all API routes
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/health", get(Self::health_handler))
            .route("/api/login", post(Self::login_handler))
            .route("/api/caller-role", get(Self::caller_role_handler))
            .route("/api/is-admin", get(Self::is_admin_handler))
            .route("/api/roles", post(Self::assign_role_handler))
            .route(
                "/api/profile",
                get(Self::get_profile_handler).put(Self::save_profile_handler),
            )
            .route(
                "/api/profile/certificates",
                get(Self::profile_certificates_handler),
            )
            .route("/api/users/:principal/profile", get(Self::user_profile_handler))
            .route("/api/compute-hash", post(Self::compute_hash_handler))
            .route("/api/canonical-rules", get(Self::canonical_rules_handler))
            .route("/api/certificates", post(Self::issue_certificate_handler))
            .route("/api/certificates/:id", get(Self::get_certificate_handler))
            .route(
                "/api/students/:student_id/certificates",
                get(Self::student_certificates_handler),
            )
            .route("/api/certificate-history", get(Self::history_handler))
            .route("/api/verify", post(Self::verify_handler))
            .route("/api/verify/:id", get(Self::verify_by_id_handler))
            .layer(CorsLayer::permissive())
            .with_state(Arc::new(self.clone()))
    }

    /// Starts the API server and begins listening for requests
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to (e.g., "127.0.0.1:5000")
    pub async fn run(&self, addr: SocketAddr) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("API server running at http://{}", addr);
        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    // =====================
    // Session Handlers
    // =====================

    async fn health_handler() -> impl IntoResponse {
        Json(json!({ "ok": true }))
    }

    /// Authenticates the admin and returns a session token
    ///
    /// # Endpoint
    /// POST /api/login
    ///
    /// # Responses
    /// - 200 OK: Returns token
    /// - 401 Unauthorized: Invalid credentials
    async fn login_handler(
        State(state): State<Arc<ApiServer>>,
        ApiJson(payload): ApiJson<LoginRequest>,
    ) -> Result<Json<LoginResponse>> {
        let token = state.access_control.login(&payload.email, &payload.password)?;
        Ok(Json(LoginResponse {
            token,
            role: UserRole::Admin,
        }))
    }

    async fn caller_role_handler(
        State(state): State<Arc<ApiServer>>,
        headers: HeaderMap,
    ) -> impl IntoResponse {
        Json(CallerRoleResponse {
            role: state.access_control.caller_role(bearer_token(&headers)),
        })
    }

    async fn is_admin_handler(
        State(state): State<Arc<ApiServer>>,
        headers: HeaderMap,
    ) -> impl IntoResponse {
        Json(IsAdminResponse {
            is_admin: state.access_control.is_admin(bearer_token(&headers)),
        })
    }

    // =====================
    // Account Handlers
    // =====================

    /// Assigns a role to a principal and hands back a token for them
    ///
    /// # Endpoint
    /// POST /api/roles
    ///
    /// # Responses
    /// - 200 OK: Assigned role, with a token unless the role was revoked
    /// - 400 Bad Request: Blank principal or the configured admin
    /// - 401/403: Missing token or caller is not an admin
    async fn assign_role_handler(
        State(state): State<Arc<ApiServer>>,
        headers: HeaderMap,
        ApiJson(payload): ApiJson<AssignRoleRequest>,
    ) -> Result<Json<AssignRoleResponse>> {
        let admin = state.access_control.require_admin(bearer_token(&headers))?;
        let token = state
            .access_control
            .assign_role(&admin, &payload.principal, payload.role)?;
        Ok(Json(AssignRoleResponse {
            principal: payload.principal.trim().to_lowercase(),
            role: payload.role,
            token,
        }))
    }

    /// GET /api/profile; `null` until the caller saves a profile
    async fn get_profile_handler(
        State(state): State<Arc<ApiServer>>,
        headers: HeaderMap,
    ) -> Result<Json<Option<UserProfile>>> {
        let caller = state.access_control.require_member(bearer_token(&headers))?;
        Ok(Json(state.accounts.profile(&caller.principal)?))
    }

    /// PUT /api/profile
    async fn save_profile_handler(
        State(state): State<Arc<ApiServer>>,
        headers: HeaderMap,
        ApiJson(profile): ApiJson<UserProfile>,
    ) -> Result<Json<UserProfile>> {
        let caller = state.access_control.require_member(bearer_token(&headers))?;
        let saved = state.accounts.save_profile(&caller.principal, &profile)?;
        info!("Saved profile for {}", caller.principal);
        Ok(Json(saved))
    }

    /// Certificates issued to the student id on the caller's profile
    ///
    /// # Endpoint
    /// GET /api/profile/certificates
    async fn profile_certificates_handler(
        State(state): State<Arc<ApiServer>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<CertificateRecord>>> {
        let caller = state.access_control.require_member(bearer_token(&headers))?;
        let student_id = state
            .accounts
            .profile(&caller.principal)?
            .and_then(|profile| profile.student_id);
        match student_id {
            Some(student_id) => Ok(Json(state.store.get_by_student_id(&student_id)?)),
            None => Ok(Json(Vec::new())),
        }
    }

    /// Profile of another principal; admins may read any, others only their own
    ///
    /// # Endpoint
    /// GET /api/users/:principal/profile
    async fn user_profile_handler(
        State(state): State<Arc<ApiServer>>,
        headers: HeaderMap,
        Path(principal): Path<String>,
    ) -> Result<Json<UserProfile>> {
        let caller = state.access_control.require_member(bearer_token(&headers))?;
        if !caller.is_admin() && caller.principal != principal.trim().to_lowercase() {
            return Err(CertifyError::Forbidden(format!(
                "{} may not read other profiles",
                caller.principal
            )));
        }
        state
            .accounts
            .profile(&principal)?
            .map(Json)
            .ok_or_else(|| CertifyError::NotFound(format!("profile of {}", principal)))
    }

    // =====================
    // Hashing Handlers
    // =====================

    /// Computes the content hash of certificate fields without storing anything
    ///
    /// # Endpoint
    /// POST /api/compute-hash
    async fn compute_hash_handler(ApiJson(fields): ApiJson<CertificateFields>) -> impl IntoResponse {
        Json(ComputeHashResponse {
            hash: compute_hash(&fields),
            canonical: canonical_certificate_string(&fields),
        })
    }

    async fn canonical_rules_handler() -> impl IntoResponse {
        Json(CanonicalRulesResponse {
            rules: CANONICAL_RULES.iter().map(|r| r.to_string()).collect(),
        })
    }

    // =====================
    // Certificate Handlers
    // =====================

    /// Issues a new certificate
    ///
    /// # Endpoint
    /// POST /api/certificates
    ///
    /// # Responses
    /// - 201 Created: Returns the stored certificate
    /// - 400 Bad Request: Blank field or year out of range
    /// - 401/403: Missing token or caller is not an admin
    /// - 503 Service Unavailable: Store could not record the certificate
    async fn issue_certificate_handler(
        State(state): State<Arc<ApiServer>>,
        headers: HeaderMap,
        ApiJson(fields): ApiJson<CertificateFields>,
    ) -> Result<(StatusCode, Json<CertificateRecord>)> {
        let caller = state.access_control.require_admin(bearer_token(&headers))?;
        let record = state.certificate_issuer.issue(&caller.principal, &fields)?;
        Ok((StatusCode::CREATED, Json(record)))
    }

    /// GET /api/certificates/:id
    async fn get_certificate_handler(
        State(state): State<Arc<ApiServer>>,
        Path(id): Path<u64>,
    ) -> Result<Json<CertificateRecord>> {
        state
            .store
            .get(id)?
            .map(Json)
            .ok_or_else(|| CertifyError::NotFound(format!("certificate {}", id)))
    }

    /// GET /api/students/:student_id/certificates
    async fn student_certificates_handler(
        State(state): State<Arc<ApiServer>>,
        Path(student_id): Path<String>,
    ) -> Result<Json<Vec<CertificateRecord>>> {
        Ok(Json(state.store.get_by_student_id(&student_id)?))
    }

    /// GET /api/certificate-history?pageIndex=0&pageSize=10
    async fn history_handler(
        State(state): State<Arc<ApiServer>>,
        Query(query): Query<HistoryQuery>,
    ) -> Result<Json<CertificateHistory>> {
        let page_index = query.page_index.unwrap_or(0);
        let page_size = query
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        Ok(Json(state.store.history(page_index, page_size)?))
    }

    // =====================
    // Verification Handlers
    // =====================

    /// Verifies a certificate
    ///
    /// # Endpoint
    /// POST /api/verify
    ///
    /// # Responses
    /// - 200 OK: Verification result (valid, invalid or not-found)
    /// - 400 Bad Request: Neither certificateId nor studentId given
    /// - 503 Service Unavailable: Store unreachable
    async fn verify_handler(
        State(state): State<Arc<ApiServer>>,
        ApiJson(payload): ApiJson<VerifyCertificateRequest>,
    ) -> Result<Json<VerificationResult>> {
        let lookup = match (payload.certificate_id, payload.student_id) {
            (Some(id), _) => LookupKey::Id(id),
            (None, Some(student_id)) if !student_id.trim().is_empty() => {
                LookupKey::StudentId(student_id)
            }
            _ => {
                return Err(CertifyError::InvalidInput(
                    "certificateId or studentId is required".into(),
                ))
            }
        };
        Ok(Json(state.verifier.verify(&lookup, payload.claimed.as_ref())?))
    }

    /// Target of the QR/verification link: checks the record on file
    ///
    /// # Endpoint
    /// GET /api/verify/:id
    async fn verify_by_id_handler(
        State(state): State<Arc<ApiServer>>,
        Path(id): Path<u64>,
    ) -> Result<Json<VerificationResult>> {
        Ok(Json(state.verifier.verify(&LookupKey::Id(id), None)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::certificate_store::LedgerStore;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app_with_store(store: Arc<dyn CertificateStore>) -> Router {
        let accounts = AccountRegistry::in_memory();
        ApiServer::new(
            CertificateIssuer::new(store.clone(), "http://localhost:5000"),
            Verifier::new(store.clone()),
            AccessControl::new("test-secret", "admin@certify.com", "admin123", 3600, accounts.clone()),
            store,
            accounts,
        )
        .router()
    }

    fn app() -> Router {
        app_with_store(Arc::new(LedgerStore::in_memory()))
    }

    /// Store whose backend cannot be reached.
    struct UnreachableStore;

    impl CertificateStore for UnreachableStore {
        fn get(&self, _id: u64) -> Result<Option<CertificateRecord>> {
            Err(CertifyError::Unavailable("connection refused".into()))
        }
        fn get_by_student_id(&self, _student_id: &str) -> Result<Vec<CertificateRecord>> {
            Err(CertifyError::Unavailable("connection refused".into()))
        }
        fn create(
            &self,
            _fields: CertificateFields,
            _hash: String,
            _url: String,
            _issuer: String,
        ) -> Result<CertificateRecord> {
            Err(CertifyError::Unavailable("connection refused".into()))
        }
        fn history(&self, _page_index: usize, _page_size: usize) -> Result<CertificateHistory> {
            Err(CertifyError::Unavailable("connection refused".into()))
        }
        fn count(&self) -> Result<usize> {
            Err(CertifyError::Unavailable("connection refused".into()))
        }
    }

    async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn admin_token(app: &Router) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/login",
            None,
            Some(json!({ "email": "admin@certify.com", "password": "admin123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    fn john_doe() -> Value {
        json!({
            "studentName": "John Doe",
            "studentId": "STU123456",
            "degree": "Bachelor of Computer Science",
            "year": 2024
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), "GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_bad_login() {
        let (status, body) = send(
            &app(),
            "POST",
            "/api/login",
            None,
            Some(json!({ "email": "admin@certify.com", "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["message"].as_str().unwrap().contains("invalid credentials"));
    }

    #[tokio::test]
    async fn test_caller_role() {
        let app = app();
        let (_, body) = send(&app, "GET", "/api/caller-role", None, None).await;
        assert_eq!(body["role"], "guest");
        let token = admin_token(&app).await;
        let (_, body) = send(&app, "GET", "/api/caller-role", Some(&token), None).await;
        assert_eq!(body["role"], "admin");
    }

    #[tokio::test]
    async fn test_compute_hash_ignores_key_order_and_whitespace() {
        let app = app();
        let reordered = json!({
            "year": 2024,
            "degree": " Bachelor of Computer Science ",
            "studentId": "STU123456",
            "studentName": "John Doe  "
        });
        let (status, body) = send(&app, "POST", "/api/compute-hash", None, Some(reordered)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["hash"],
            "ba399f1040fdee2cb105c2379b514008cea950b8972acb954d975c6a1d70994d"
        );
        assert_eq!(
            body["canonical"],
            r#"{"studentName":"John Doe","studentId":"STU123456","degree":"Bachelor of Computer Science","year":2024}"#
        );
    }

    #[tokio::test]
    async fn test_canonical_rules() {
        let (status, body) = send(&app(), "GET", "/api/canonical-rules", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rules"].as_array().unwrap().len(), CANONICAL_RULES.len());
    }

    #[tokio::test]
    async fn test_issue_requires_admin_token() {
        let app = app();
        let (status, _) = send(&app, "POST", "/api/certificates", None, Some(john_doe())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "POST", "/api/certificates", Some("garbage"), Some(john_doe())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (_, history) = send(&app, "GET", "/api/certificate-history", None, None).await;
        assert_eq!(history["totalCertificates"], 0);
    }

    #[tokio::test]
    async fn test_issue_rejects_bad_year() {
        let app = app();
        let token = admin_token(&app).await;
        let mut fields = john_doe();
        fields["year"] = json!(1850);
        let (status, body) = send(&app, "POST", "/api/certificates", Some(&token), Some(fields)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("year"));
    }

    #[tokio::test]
    async fn test_end_to_end_issue_and_verify() {
        let app = app();
        let token = admin_token(&app).await;

        let (status, issued) = send(&app, "POST", "/api/certificates", Some(&token), Some(john_doe())).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = issued["id"].as_u64().unwrap();
        let hash = issued["hash"].as_str().unwrap().to_string();
        assert_eq!(issued["issuer"], "admin@certify.com");
        assert_eq!(issued["certificateUrl"], format!("http://localhost:5000/verify?certId={}", id));

        let (status, on_file) = send(&app, "GET", &format!("/api/verify/{}", id), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(on_file["isValid"], true);
        assert_eq!(on_file["status"], "valid");
        assert_eq!(on_file["certificate"]["hash"], hash.as_str());

        let jane = json!({
            "certificateId": id,
            "claimed": {
                "studentName": "Jane Doe",
                "studentId": "STU123456",
                "degree": "Bachelor of Computer Science",
                "year": 2024
            }
        });
        let (status, claim) = send(&app, "POST", "/api/verify", None, Some(jane)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(claim["isValid"], false);
        assert_eq!(claim["status"], "invalid");
        assert_eq!(claim["certificate"]["studentName"], "John Doe");

        let by_student = json!({ "studentId": "STU123456", "claimed": john_doe() });
        let (_, matched) = send(&app, "POST", "/api/verify", None, Some(by_student)).await;
        assert_eq!(matched["status"], "valid");
    }

    #[tokio::test]
    async fn test_unknown_certificate() {
        let app = app();
        let (status, body) = send(&app, "GET", "/api/verify/99", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "not-found");
        assert_eq!(body["isValid"], false);
        assert!(body.get("certificate").is_none());

        let (status, _) = send(&app, "GET", "/api/certificates/99", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_verify_requires_lookup_key() {
        let (status, _) = send(&app(), "POST", "/api/verify", None, Some(json!({ "studentId": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_lookup_and_history() {
        let app = app();
        let token = admin_token(&app).await;
        for (name, student) in [("Ada", "S1"), ("Bob", "S2"), ("Ada", "S1")] {
            let fields = json!({ "studentName": name, "studentId": student, "degree": "BSc", "year": 2024 });
            let (status, _) = send(&app, "POST", "/api/certificates", Some(&token), Some(fields)).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, cert) = send(&app, "GET", "/api/certificates/2", None, None).await;
        assert_eq!(cert["studentName"], "Bob");

        let (_, list) = send(&app, "GET", "/api/students/S1/certificates", None, None).await;
        let ids: Vec<u64> = list.as_array().unwrap().iter().map(|c| c["id"].as_u64().unwrap()).collect();
        assert_eq!(ids, vec![1, 3]);

        let (_, page) = send(&app, "GET", "/api/certificate-history?pageIndex=0&pageSize=2", None, None).await;
        assert_eq!(page["totalCertificates"], 3);
        assert_eq!(page["pageSize"], 2);
        let ids: Vec<u64> = page["certificates"].as_array().unwrap().iter().map(|c| c["id"].as_u64().unwrap()).collect();
        assert_eq!(ids, vec![3, 2]);

        let (_, clamped) = send(&app, "GET", "/api/certificate-history?pageSize=0", None, None).await;
        assert_eq!(clamped["pageSize"], 1);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = app();
        let mut fields = john_doe();
        fields["year"] = json!("twenty");
        let (status, body) = send(&app, "POST", "/api/compute-hash", None, Some(fields.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("year"));

        let token = admin_token(&app).await;
        let (status, body) = send(&app, "POST", "/api/certificates", Some(&token), Some(fields)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());

        let mut claimed = john_doe();
        claimed["year"] = json!(-1);
        let (status, body) = send(
            &app,
            "POST",
            "/api/verify",
            None,
            Some(json!({ "certificateId": 1, "claimed": claimed })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_store_fault_is_service_unavailable() {
        let app = app_with_store(Arc::new(UnreachableStore));

        let (status, body) = send(&app, "GET", "/api/verify/1", None, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["message"].as_str().unwrap().contains("connection refused"));

        let by_student = json!({ "studentId": "STU123456", "claimed": john_doe() });
        let (status, _) = send(&app, "POST", "/api/verify", None, Some(by_student)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) = send(&app, "GET", "/api/certificate-history", None, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let token = admin_token(&app).await;
        let (status, _) = send(&app, "POST", "/api/certificates", Some(&token), Some(john_doe())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    async fn assign(app: &Router, token: &str, principal: &str, role: &str) -> (StatusCode, Value) {
        send(
            app,
            "POST",
            "/api/roles",
            Some(token),
            Some(json!({ "principal": principal, "role": role })),
        )
        .await
    }

    #[tokio::test]
    async fn test_role_assignment_and_is_admin() {
        let app = app();
        let admin = admin_token(&app).await;
        let (_, body) = send(&app, "GET", "/api/is-admin", Some(&admin), None).await;
        assert_eq!(body["isAdmin"], true);

        let (status, assigned) = assign(&app, &admin, "Ada@Uni.edu", "user").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(assigned["principal"], "ada@uni.edu");
        assert_eq!(assigned["role"], "user");
        let user = assigned["token"].as_str().unwrap().to_string();

        let (_, body) = send(&app, "GET", "/api/is-admin", Some(&user), None).await;
        assert_eq!(body["isAdmin"], false);
        let (_, body) = send(&app, "GET", "/api/caller-role", Some(&user), None).await;
        assert_eq!(body["role"], "user");

        let (status, _) = send(&app, "POST", "/api/certificates", Some(&user), Some(john_doe())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = assign(&app, &user, "bob@uni.edu", "admin").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = assign(&app, &admin, "admin@certify.com", "guest").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, revoked) = assign(&app, &admin, "ada@uni.edu", "guest").await;
        assert_eq!(status, StatusCode::OK);
        assert!(revoked.get("token").is_none());
        let (_, body) = send(&app, "GET", "/api/caller-role", Some(&user), None).await;
        assert_eq!(body["role"], "guest");
    }

    #[tokio::test]
    async fn test_profile_lists_own_certificates() {
        let app = app();
        let admin = admin_token(&app).await;
        let (_, assigned) = assign(&app, &admin, "john@uni.edu", "user").await;
        let user = assigned["token"].as_str().unwrap().to_string();

        let (status, body) = send(&app, "GET", "/api/profile", Some(&user), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);

        let (status, _) = send(&app, "GET", "/api/profile", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (_, listed) = send(&app, "GET", "/api/profile/certificates", Some(&user), None).await;
        assert_eq!(listed, json!([]));

        let (status, _) = send(&app, "PUT", "/api/profile", Some(&user), Some(json!({ "name": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let profile = json!({ "name": " John Doe ", "studentId": "STU123456" });
        let (status, saved) = send(&app, "PUT", "/api/profile", Some(&user), Some(profile)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved, json!({ "name": "John Doe", "studentId": "STU123456" }));

        for student in [john_doe(), json!({ "studentName": "Ada", "studentId": "S1", "degree": "BSc", "year": 2024 })] {
            let (status, _) = send(&app, "POST", "/api/certificates", Some(&admin), Some(student)).await;
            assert_eq!(status, StatusCode::CREATED);
        }
        let (_, listed) = send(&app, "GET", "/api/profile/certificates", Some(&user), None).await;
        let ids: Vec<u64> = listed.as_array().unwrap().iter().map(|c| c["id"].as_u64().unwrap()).collect();
        assert_eq!(ids, vec![1]);

        let (status, own) = send(&app, "GET", "/api/users/john@uni.edu/profile", Some(&user), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(own["name"], "John Doe");
        let (status, read) = send(&app, "GET", "/api/users/john@uni.edu/profile", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(read["studentId"], "STU123456");
        let (status, _) = send(&app, "GET", "/api/users/admin@certify.com/profile", Some(&user), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, "GET", "/api/users/nobody@uni.edu/profile", Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
