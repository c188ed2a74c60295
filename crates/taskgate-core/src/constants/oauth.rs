// ABOUTME: OAuth 2.0 protocol strings, token header tags, and default lifetimes
// ABOUTME: Shared by the issuer, flow manager, and configuration defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

/// Only supported `response_type`
pub const RESPONSE_TYPE_CODE: &str = "code";

/// Only supported `grant_type`
pub const GRANT_TYPE_AUTHORIZATION_CODE: &str = "authorization_code";

/// `token_type` returned from the token endpoint
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// `Authorization` header scheme prefix, including the separating space
pub const BEARER_PREFIX: &str = "Bearer ";

/// Signed token header `alg` tag
pub const TOKEN_ALG_HS256: &str = "HS256";

/// Signed token header `typ` tag
pub const TOKEN_TYP_JWT: &str = "JWT";

/// Random bytes in an authorization code (256 bits)
pub const AUTH_CODE_BYTES: usize = 32;

/// Random bytes behind each token's `jti` claim
pub const TOKEN_ID_BYTES: usize = 16;

/// Default authorization code lifetime
pub const DEFAULT_AUTH_CODE_TTL_MINUTES: i64 = 10;

/// Default access token lifetime
pub const DEFAULT_ACCESS_TOKEN_TTL_HOURS: i64 = 24;

/// Minimum accepted password length at registration
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Scope required by the principal self-inspection endpoint
pub const SCOPE_TASKS_READ: &str = "tasks:read";

/// Scope granting write access to tasks
pub const SCOPE_TASKS_WRITE: &str = "tasks:write";
