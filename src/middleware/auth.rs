// ABOUTME: Request authorizer validating bearer tokens against signature, expiry, and store liveness
// ABOUTME: Produces a typed AuthContext for handlers and enforces per-operation scopes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Utc};
use http::header::AUTHORIZATION;

use crate::auth::{Claims, CredentialIssuer};
use crate::database::{AccessTokenRepository, Store, UserRepository};
use crate::errors::{AppError, AppResult, ErrorCode};
use taskgate_core::constants::oauth::BEARER_PREFIX;
use taskgate_core::models::{AccessToken, User};

/// Everything a protected handler learns about its caller
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Resolved principal
    pub user: User,
    /// Verified token claims
    pub claims: Claims,
    /// Live store record for the presented token
    pub token: AccessToken,
}

impl AuthContext {
    /// Fail with `InsufficientScope` unless the token grants `required`
    ///
    /// # Errors
    /// Returns `InsufficientScope` when the scope tag is absent
    pub fn require_scope(&self, required: &str) -> AppResult<()> {
        if RequestAuthorizer::check_scope(&self.claims, required) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.user.id,
                required_scope = required,
                "Request lacks required scope"
            );
            Err(AppError::from_code(ErrorCode::InsufficientScope))
        }
    }
}

/// Validates the `Authorization` header of inbound requests
#[derive(Clone)]
pub struct RequestAuthorizer {
    store: Arc<dyn Store>,
    issuer: CredentialIssuer,
}

impl RequestAuthorizer {
    /// Create an authorizer over `store`, verifying with `issuer`
    #[must_use]
    pub fn new(store: Arc<dyn Store>, issuer: CredentialIssuer) -> Self {
        Self { store, issuer }
    }

    /// Authorize a request from its raw `Authorization` header value
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The header is missing (`MissingAuth`) or not `Bearer <token>` (`MalformedAuth`)
    /// - The token fails signature, structure, or expiry checks (`InvalidToken`)
    /// - No live store record exists for the token (`TokenRevokedOrUnknown`)
    /// - The subject no longer resolves to a principal (`PrincipalNotFound`)
    /// - The store fails (`StoreUnavailable`)
    pub async fn authorize_request(&self, auth_header: Option<&str>) -> AppResult<AuthContext> {
        self.authorize_request_at(auth_header, Utc::now()).await
    }

    /// [`Self::authorize_request`] at an explicit instant
    ///
    /// # Errors
    /// See [`Self::authorize_request`]
    #[tracing::instrument(
        skip(self, auth_header, now),
        fields(
            user_id = tracing::field::Empty,
            success = tracing::field::Empty,
        )
    )]
    pub async fn authorize_request_at(
        &self,
        auth_header: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<AuthContext> {
        let result = self.authorize_inner(auth_header, now).await;

        let span = tracing::Span::current();
        match &result {
            Ok(context) => {
                span.record("user_id", context.user.id.to_string())
                    .record("success", true);
                tracing::debug!("Bearer authentication successful");
            }
            Err(e) => {
                span.record("success", false);
                tracing::warn!(error_code = %e.code, "Bearer authentication failed");
            }
        }
        result
    }

    async fn authorize_inner(
        &self,
        auth_header: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<AuthContext> {
        // A blank header carries no credentials at all
        let header = auth_header
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| AppError::from_code(ErrorCode::MissingAuth))?;
        let token = extract_bearer_token(header)?;

        // Signature, structure, and expiry failures all look the same to the caller
        let claims = self.issuer.verify_at(token, now).map_err(|e| {
            tracing::debug!(reason = %e, "Token verification failed");
            AppError::invalid_token()
        })?;

        let record = self
            .store
            .find_live_access_token(token, now)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::from_code(ErrorCode::TokenRevokedOrUnknown))?;

        let user = self
            .store
            .find_user_by_id(claims.principal_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::from_code(ErrorCode::PrincipalNotFound))?;

        Ok(AuthContext {
            user,
            claims,
            token: record,
        })
    }

    /// Whether `claims` grant the exact `required` scope tag
    #[must_use]
    pub fn check_scope(claims: &Claims, required: &str) -> bool {
        CredentialIssuer::has_scope(claims, required)
    }
}

/// Split `Bearer <token>` into the token, rejecting any other shape
fn extract_bearer_token(header: &str) -> AppResult<&str> {
    match header.strip_prefix(BEARER_PREFIX) {
        Some(token) if !token.is_empty() && !token.contains(' ') => Ok(token),
        _ => Err(AppError::from_code(ErrorCode::MalformedAuth)),
    }
}

/// axum middleware: authorize the request and attach [`AuthContext`] as an extension
///
/// # Errors
/// Returns the authorizer's error as the response when authorization fails
pub async fn require_bearer_auth(
    State(authorizer): State<Arc<RequestAuthorizer>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AppError::from_code(ErrorCode::MalformedAuth)))
        .transpose()?;

    let context = authorizer.authorize_request(header).await?;
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}
