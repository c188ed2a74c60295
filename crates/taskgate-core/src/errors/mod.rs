// ABOUTME: Unified error taxonomy for credential issuance and verification
// ABOUTME: Maps every failure to an OAuth-style code and a fixed HTTP status
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

//! # Unified Error Handling
//!
//! Every failure surfaced by the authorization server is an [`AppError`]
//! carrying an [`ErrorCode`]. The code alone decides the HTTP status and the
//! `error` field of the response body, so two distinct internal causes that
//! share a code are indistinguishable to a caller.

/// Store-level error types
#[cfg(feature = "database-errors")]
pub mod database;

#[cfg(feature = "database-errors")]
pub use database::DatabaseError;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the authorization server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Protocol parameters
    /// Malformed or mismatched OAuth parameters
    InvalidRequest,
    /// Grant type other than `authorization_code`
    UnsupportedGrantType,

    // Credentials
    /// Unknown email or wrong password (merged case)
    InvalidCredentials,
    /// Unknown, expired, or already exchanged authorization code
    InvalidGrant,
    /// Client secret mismatch
    InvalidClient,

    // Bearer authentication
    /// No `Authorization` header
    MissingAuth,
    /// `Authorization` header not of the shape `Bearer <token>`
    MalformedAuth,
    /// Signature, structure, or expiry failure on a presented token (merged case)
    InvalidToken,
    /// Token verified but has no live store record
    TokenRevokedOrUnknown,
    /// Token subject no longer resolves to a principal
    PrincipalNotFound,
    /// Token lacks the scope an operation requires
    InsufficientScope,

    // Resources
    /// Unique constraint violated (e.g. duplicate email)
    ResourceAlreadyExists,

    // Faults
    /// Persistence collaborator failed
    StoreUnavailable,
    /// Startup configuration is invalid
    ConfigInvalid,
    /// Any other internal fault
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            // 400 Bad Request
            Self::InvalidRequest | Self::UnsupportedGrantType => 400,

            // 401 Unauthorized
            Self::InvalidCredentials
            | Self::InvalidGrant
            | Self::InvalidClient
            | Self::MissingAuth
            | Self::MalformedAuth
            | Self::InvalidToken
            | Self::TokenRevokedOrUnknown
            | Self::PrincipalNotFound => 401,

            // 403 Forbidden
            Self::InsufficientScope => 403,

            // 409 Conflict
            Self::ResourceAlreadyExists => 409,

            // 500 Internal Server Error
            Self::StoreUnavailable | Self::ConfigInvalid | Self::InternalError => 500,
        }
    }

    /// Wire name used in the `error` field of response bodies
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::InvalidCredentials => "invalid_credentials",
            Self::InvalidGrant => "invalid_grant",
            Self::InvalidClient => "invalid_client",
            Self::MissingAuth => "missing_auth",
            Self::MalformedAuth => "malformed_auth",
            Self::InvalidToken => "invalid_token",
            Self::TokenRevokedOrUnknown => "token_revoked_or_unknown",
            Self::PrincipalNotFound => "principal_not_found",
            Self::InsufficientScope => "insufficient_scope",
            Self::ResourceAlreadyExists => "resource_already_exists",
            Self::StoreUnavailable => "store_unavailable",
            Self::ConfigInvalid => "config_invalid",
            Self::InternalError => "internal_error",
        }
    }

    /// Get a user-facing description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InvalidRequest => "The request parameters are invalid",
            Self::UnsupportedGrantType => "Grant type not supported",
            Self::InvalidCredentials => "Invalid credentials",
            Self::InvalidGrant => "Invalid or expired authorization code",
            Self::InvalidClient => "Client authentication failed",
            Self::MissingAuth => "Authorization header required",
            Self::MalformedAuth => "Invalid authorization header format. Use 'Bearer <token>'",
            Self::InvalidToken => "Invalid or expired token",
            Self::TokenRevokedOrUnknown => "Token not found or expired",
            Self::PrincipalNotFound => "User not found",
            Self::InsufficientScope => "Insufficient permissions",
            Self::ResourceAlreadyExists => "A resource with this identifier already exists",
            Self::StoreUnavailable => "Storage backend unavailable",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::InternalError => "An internal server error occurred",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message, safe to return to the caller
    pub message: String,
    /// Source error for error chaining (never serialized)
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create an error whose message is the code's canonical description
    #[must_use]
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.description())
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Malformed or mismatched protocol parameters
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Bad email or password, without saying which
    #[must_use]
    pub fn invalid_credentials() -> Self {
        Self::from_code(ErrorCode::InvalidCredentials)
    }

    /// Unknown, expired, or consumed authorization code, without saying which
    #[must_use]
    pub fn invalid_grant() -> Self {
        Self::from_code(ErrorCode::InvalidGrant)
    }

    /// Client secret mismatch
    #[must_use]
    pub fn invalid_client() -> Self {
        Self::from_code(ErrorCode::InvalidClient)
    }

    /// Grant type other than `authorization_code`
    #[must_use]
    pub fn unsupported_grant_type() -> Self {
        Self::from_code(ErrorCode::UnsupportedGrantType)
    }

    /// Any failure to verify a presented token
    #[must_use]
    pub fn invalid_token() -> Self {
        Self::from_code(ErrorCode::InvalidToken)
    }

    /// Storage collaborator failure
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StoreUnavailable, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalid, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl From<ErrorCode> for AppError {
    fn from(code: ErrorCode) -> Self {
        Self::from_code(code)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response body, shaped like an RFC 6749 error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code
    pub error: ErrorCode,
    /// Human-readable error description
    pub error_description: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        Self {
            error: error.code,
            error_description: error.message.clone(),
        }
    }
}

#[cfg(feature = "http-response")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = http::StatusCode::from_u16(self.http_status())
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %self, source = ?self.source, "Request failed with server error");
        }

        (status, axum::Json(ErrorResponse::from(&self))).into_response()
    }
}
