// ABOUTME: HTTP middleware for bearer authentication and scope gating
// ABOUTME: Binds the verified principal and claims to each protected request

/// Bearer token request authorizer
pub mod auth;

pub use auth::{require_bearer_auth, AuthContext, RequestAuthorizer};
