// ABOUTME: OAuth 2.0 request and response types for the authorization-code flow
// ABOUTME: Field names follow RFC 6749 so forms and JSON bodies bind directly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

use serde::{Deserialize, Serialize};

/// OAuth 2.0 Authorization Request (query string of `GET /oauth/authorize`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizeRequest {
    /// Response type (only `code`)
    #[serde(default)]
    pub response_type: String,
    /// Client identifier
    #[serde(default)]
    pub client_id: String,
    /// Redirect URI for the code
    #[serde(default)]
    pub redirect_uri: String,
    /// Requested scopes
    pub scope: Option<String>,
    /// Opaque client state, echoed back on redirect
    pub state: Option<String>,
}

/// Validated authorization parameters to carry into the credential prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginPrompt {
    /// Client identifier
    pub client_id: String,
    /// Redirect URI
    pub redirect_uri: String,
    /// Requested scopes, unmodified
    pub scope: Option<String>,
    /// Client state, unmodified
    pub state: Option<String>,
}

/// Credential form posted to `POST /oauth/login`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    /// Principal email
    #[serde(default)]
    pub email: String,
    /// Principal password
    #[serde(default)]
    pub password: String,
    /// Client identifier carried from the prompt
    #[serde(default)]
    pub client_id: String,
    /// Redirect URI carried from the prompt
    #[serde(default)]
    pub redirect_uri: String,
    /// Requested scopes carried from the prompt
    pub scope: Option<String>,
    /// Client state carried from the prompt
    pub state: Option<String>,
}

/// OAuth 2.0 Token Request (form body of `POST /oauth/token`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    /// Grant type (only `authorization_code`)
    #[serde(default)]
    pub grant_type: String,
    /// Authorization code
    pub code: Option<String>,
    /// Redirect URI; when present it must match registration
    pub redirect_uri: Option<String>,
    /// Client ID
    #[serde(default)]
    pub client_id: String,
    /// Client secret
    #[serde(default)]
    pub client_secret: String,
}

/// OAuth 2.0 Token Response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Signed access token
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    /// Scopes granted
    pub scope: String,
}

/// Registration body of `POST /oauth/register`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    /// Login email
    #[serde(default)]
    pub email: String,
    /// Plaintext password, hashed before storage
    #[serde(default)]
    pub password: String,
}

/// Query string delivered to the redirect URI
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code
    pub code: Option<String>,
    /// Echoed client state
    pub state: Option<String>,
}

/// Body returned by the demo callback endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackResponse {
    /// Status message
    pub message: String,
    /// Authorization code to exchange
    pub code: String,
    /// Echoed client state
    pub state: String,
    /// How to continue the flow
    pub next_step: String,
}

/// Records removed by one expiry sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Authorization codes deleted
    pub auth_codes_removed: u64,
    /// Access token records deleted
    pub access_tokens_removed: u64,
}
