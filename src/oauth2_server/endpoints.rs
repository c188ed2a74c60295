// ABOUTME: Authorization flow manager issuing single-use codes and exchanging them for tokens
// ABOUTME: Validates client parameters, authenticates principals, and retires expired records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

use std::sync::Arc;

use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;
use tracing::{debug, error, info, warn};

use super::models::{
    AuthorizeRequest, CleanupReport, LoginPrompt, LoginRequest, RegisterRequest, TokenRequest,
    TokenResponse,
};
use super::typestate::AuthorizationAttempt;
use crate::auth::CredentialIssuer;
use crate::config::OAuthClientConfig;
use crate::crypto::{generate_random_string, PasswordHasher};
use crate::database::{
    AccessTokenRepository, AuthCodeRepository, DatabaseError, Store, UserRepository,
};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::logging::AppLogger;
use taskgate_core::constants::oauth::{
    AUTH_CODE_BYTES, GRANT_TYPE_AUTHORIZATION_CODE, MIN_PASSWORD_LENGTH, RESPONSE_TYPE_CODE,
    TOKEN_TYPE_BEARER,
};
use taskgate_core::models::{AccessToken, AuthorizationCode, PrincipalView, User};

/// OAuth 2.0 Authorization Server
///
/// Owns no mutable state of its own; every single-use and liveness decision
/// is delegated to the store.
pub struct OAuth2AuthorizationServer {
    store: Arc<dyn Store>,
    issuer: CredentialIssuer,
    hasher: PasswordHasher,
    client: OAuthClientConfig,
}

impl OAuth2AuthorizationServer {
    /// Assemble the flow manager from its collaborators
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        issuer: CredentialIssuer,
        hasher: PasswordHasher,
        client: OAuthClientConfig,
    ) -> Self {
        debug!(
            bcrypt_cost = hasher.cost(),
            client_id = %client.client_id,
            "Authorization server configured"
        );
        Self {
            store,
            issuer,
            hasher,
            client,
        }
    }

    /// Shared store handle
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Token issuer used for exchange
    #[must_use]
    pub const fn issuer(&self) -> &CredentialIssuer {
        &self.issuer
    }

    /// Reject anything but the registered client and its exact redirect URI
    fn validate_client(&self, client_id: &str, redirect_uri: &str) -> AppResult<()> {
        if client_id != self.client.client_id {
            AppLogger::log_security_event("unknown_client", "client_id mismatch", Some(client_id));
            return Err(AppError::invalid_request("Invalid client_id"));
        }
        if redirect_uri != self.client.redirect_uri {
            AppLogger::log_security_event(
                "redirect_mismatch",
                "redirect_uri does not match registration",
                Some(client_id),
            );
            return Err(AppError::invalid_request("Invalid redirect_uri"));
        }
        Ok(())
    }

    /// Handle authorization request (GET /oauth/authorize)
    ///
    /// # Errors
    /// Returns `InvalidRequest` if `response_type`, `client_id` or
    /// `redirect_uri` do not match the registered client
    pub fn begin_authorization(&self, request: AuthorizeRequest) -> AppResult<LoginPrompt> {
        if request.response_type != RESPONSE_TYPE_CODE {
            return Err(AppError::invalid_request("response_type must be 'code'"));
        }
        self.validate_client(&request.client_id, &request.redirect_uri)?;

        debug!(client_id = %request.client_id, "Authorization request accepted");

        Ok(LoginPrompt {
            client_id: request.client_id,
            redirect_uri: request.redirect_uri,
            scope: request.scope,
            state: request.state,
        })
    }

    /// Handle credential submission (POST /oauth/login)
    ///
    /// Returns the redirect URL carrying the fresh code and the original state.
    ///
    /// # Errors
    /// Returns `InvalidRequest` for missing credentials or mismatched client
    /// parameters, `InvalidCredentials` for a bad email or password, and
    /// `StoreUnavailable` if persistence fails
    pub async fn login(&self, request: LoginRequest) -> AppResult<String> {
        if request.email.is_empty() || request.password.is_empty() {
            return Err(AppError::invalid_request("Email and password are required"));
        }
        self.validate_client(&request.client_id, &request.redirect_uri)?;

        let attempt = AuthorizationAttempt::new(
            request.client_id,
            request.redirect_uri,
            request.scope,
            request.state,
        );

        let user = self.authenticate(&request.email, request.password).await?;
        let attempt = attempt.authenticate(user);

        let code = self
            .issue_code_at(attempt.user(), attempt.client_id(), attempt.scope(), Utc::now())
            .await?;

        attempt.issue_code(code).redirect_url()
    }

    /// Authenticate a principal and persist a fresh authorization code for it
    ///
    /// # Errors
    /// Returns `InvalidCredentials` for a bad email or password and
    /// `StoreUnavailable` if persistence fails
    pub async fn authenticate_and_issue_code(
        &self,
        email: &str,
        password: &str,
        client_id: &str,
        scope: &str,
    ) -> AppResult<AuthorizationCode> {
        let user = self.authenticate(email, password.to_owned()).await?;
        self.issue_code_at(&user, client_id, scope, Utc::now()).await
    }

    /// Look up by email and verify the password, with one error for both failures
    async fn authenticate(&self, email: &str, password: String) -> AppResult<User> {
        let Some(user) = self.store.find_user_by_email(email).await.map_err(store_error)? else {
            // Same bcrypt cost as a wrong password so timing does not reveal membership
            self.hasher.verify_unknown_principal(password).await;
            AppLogger::log_security_event("login_failed", "invalid credentials", None);
            return Err(AppError::invalid_credentials());
        };

        if !PasswordHasher::verify_blocking(password, user.password_hash.clone()).await {
            AppLogger::log_security_event("login_failed", "invalid credentials", None);
            return Err(AppError::invalid_credentials());
        }

        Ok(user)
    }

    /// Persist a new code for `user`, valid for the configured code lifetime from `now`
    ///
    /// # Errors
    /// Returns `StoreUnavailable` if persistence fails
    pub async fn issue_code_at(
        &self,
        user: &User,
        client_id: &str,
        scope: &str,
        now: DateTime<Utc>,
    ) -> AppResult<AuthorizationCode> {
        let code = AuthorizationCode {
            code: generate_random_string(AUTH_CODE_BYTES)?,
            user_id: user.id,
            client_id: client_id.to_owned(),
            scope: scope.to_owned(),
            expires_at: now + self.client.code_ttl,
            created_at: now,
        };

        self.store
            .create_auth_code(&code)
            .await
            .map_err(store_error)?;

        AppLogger::log_auth_event(&user.id.to_string(), "code_issued", client_id);
        Ok(code)
    }

    /// Handle token request (POST /oauth/token)
    ///
    /// # Errors
    /// Returns `UnsupportedGrantType` for any grant but `authorization_code`,
    /// `InvalidRequest` without a code, `InvalidGrant` for a redirect mismatch
    /// or an unusable code, `InvalidClient` for a bad secret
    pub async fn exchange_token(&self, request: TokenRequest) -> AppResult<TokenResponse> {
        if request.grant_type != GRANT_TYPE_AUTHORIZATION_CODE {
            return Err(AppError::unsupported_grant_type());
        }

        let code = request
            .code
            .as_deref()
            .filter(|code| !code.is_empty())
            .ok_or_else(|| AppError::invalid_request("Authorization code is required"))?;

        if let Some(redirect_uri) = request.redirect_uri.as_deref() {
            if redirect_uri != self.client.redirect_uri {
                AppLogger::log_security_event(
                    "redirect_mismatch",
                    "token request redirect_uri does not match registration",
                    Some(&request.client_id),
                );
                return Err(AppError::invalid_grant());
            }
        }

        let token = self
            .exchange(code, &request.client_id, &request.client_secret)
            .await?;

        Ok(TokenResponse {
            access_token: token.token,
            token_type: TOKEN_TYPE_BEARER.to_owned(),
            expires_in: self.issuer.ttl().num_seconds(),
            scope: token.scope,
        })
    }

    /// Exchange a live code for a signed access token
    ///
    /// # Errors
    /// Returns `InvalidGrant` for an unknown, expired or consumed code,
    /// `InvalidClient` for a bad secret, `StoreUnavailable` if persistence fails
    pub async fn exchange(
        &self,
        code: &str,
        client_id: &str,
        client_secret: &str,
    ) -> AppResult<AccessToken> {
        self.exchange_at(code, client_id, client_secret, Utc::now())
            .await
    }

    /// [`Self::exchange`] at an explicit instant
    ///
    /// # Errors
    /// See [`Self::exchange`]
    pub async fn exchange_at(
        &self,
        code: &str,
        client_id: &str,
        client_secret: &str,
        now: DateTime<Utc>,
    ) -> AppResult<AccessToken> {
        if self
            .store
            .find_live_auth_code(code, client_id, now)
            .await
            .map_err(store_error)?
            .is_none()
        {
            AppLogger::log_security_event(
                "invalid_grant",
                "code not found, expired, or already used",
                Some(client_id),
            );
            return Err(AppError::invalid_grant());
        }

        // A wrong secret leaves the code in place for the legitimate client
        if !self.client_secret_matches(client_id, client_secret) {
            AppLogger::log_security_event("invalid_client", "client secret mismatch", Some(client_id));
            return Err(AppError::invalid_client());
        }

        let Some(auth_code) = self
            .store
            .consume_live_auth_code(code, client_id, now)
            .await
            .map_err(store_error)?
        else {
            AppLogger::log_security_event(
                "invalid_grant",
                "code consumed by a concurrent exchange",
                Some(client_id),
            );
            return Err(AppError::invalid_grant());
        };

        let Some(user) = self
            .store
            .find_user_by_id(auth_code.user_id)
            .await
            .map_err(store_error)?
        else {
            warn!(user_id = %auth_code.user_id, "Code principal no longer exists");
            return Err(AppError::invalid_grant());
        };

        let issued = self.issuer.issue_at(&user, &auth_code.scope, now)?;
        let record = AccessToken {
            token: issued.token,
            user_id: user.id,
            client_id: client_id.to_owned(),
            scope: auth_code.scope,
            expires_at: issued.expires_at,
            created_at: issued.issued_at,
        };

        self.store
            .create_access_token(&record)
            .await
            .map_err(store_error)?;

        AppLogger::log_auth_event(&user.id.to_string(), "token_issued", client_id);
        Ok(record)
    }

    fn client_secret_matches(&self, client_id: &str, client_secret: &str) -> bool {
        let id_ok = client_id.as_bytes().ct_eq(self.client.client_id.as_bytes());
        let secret_ok = client_secret
            .as_bytes()
            .ct_eq(self.client.client_secret.as_bytes());
        (id_ok & secret_ok).into()
    }

    /// Handle registration (POST /oauth/register)
    ///
    /// # Errors
    /// Returns `InvalidRequest` for an invalid email or short password and
    /// `ResourceAlreadyExists` if the email is taken
    pub async fn register(&self, request: RegisterRequest) -> AppResult<PrincipalView> {
        if !is_valid_email(&request.email) {
            return Err(AppError::invalid_request("A valid email is required"));
        }
        if request.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::invalid_request(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        let password_hash = self.hasher.hash_blocking(request.password).await?;
        let user = self
            .store
            .create_user(&request.email, &password_hash)
            .await
            .map_err(store_error)?;

        info!(user_id = %user.id, "Principal registered");
        Ok(PrincipalView::from(&user))
    }

    /// Delete every expired code and token record
    ///
    /// # Errors
    /// Returns `StoreUnavailable` if persistence fails
    pub async fn cleanup_expired(&self) -> AppResult<CleanupReport> {
        self.cleanup_expired_at(Utc::now()).await
    }

    /// [`Self::cleanup_expired`] at an explicit instant
    ///
    /// # Errors
    /// Returns `StoreUnavailable` if persistence fails
    pub async fn cleanup_expired_at(&self, now: DateTime<Utc>) -> AppResult<CleanupReport> {
        let report = CleanupReport {
            auth_codes_removed: self
                .store
                .delete_expired_auth_codes(now)
                .await
                .map_err(store_error)?,
            access_tokens_removed: self
                .store
                .delete_expired_access_tokens(now)
                .await
                .map_err(store_error)?,
        };

        if report != CleanupReport::default() {
            info!(
                auth_codes = report.auth_codes_removed,
                access_tokens = report.access_tokens_removed,
                "Expired credentials removed"
            );
        }
        Ok(report)
    }
}

/// Convert a store failure, logging anything that is not a conflict
fn store_error(error: DatabaseError) -> AppError {
    let app_error = AppError::from(error);
    if app_error.code != ErrorCode::ResourceAlreadyExists {
        error!(error = ?app_error.source, "Store operation failed");
    }
    app_error
}

/// Minimal shape check: one `@`, non-empty local part, dotted domain, no whitespace
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
