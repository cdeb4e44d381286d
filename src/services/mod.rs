pub mod access_control;
pub mod api_server;
pub mod certificate_issuer;
pub mod verifier;
