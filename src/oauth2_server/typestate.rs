// ABOUTME: Typestate pattern for one authorization attempt from request to issued code
// ABOUTME: Issuing a code before authenticating, or redirecting without a code, does not compile
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

use url::Url;

use crate::errors::{AppError, AppResult};
use taskgate_core::models::{AuthorizationCode, User};

// ============================================================================
// State Marker Types
// ============================================================================

/// Client and redirect have been validated; no principal yet
/// Valid transitions: -> Authenticated
#[derive(Debug)]
pub struct Requested;

/// Credentials checked
/// Valid transitions: -> `CodeIssued`
#[derive(Debug)]
pub struct Authenticated {
    /// Principal that logged in
    pub user: User,
}

/// Code persisted; only the redirect remains
#[derive(Debug)]
pub struct CodeIssued {
    /// The persisted code
    pub code: AuthorizationCode,
}

// ============================================================================
// Authorization Attempt
// ============================================================================

/// One pass through the authorization-code flow
///
/// The terminal `EXCHANGED` step happens later on a different request, so it
/// is not modelled here; the attempt ends once the redirect URL is built.
#[derive(Debug)]
pub struct AuthorizationAttempt<State> {
    client_id: String,
    redirect_uri: String,
    scope: String,
    state_param: Option<String>,
    state: State,
}

impl AuthorizationAttempt<Requested> {
    /// Start an attempt for already validated client parameters
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        scope: Option<String>,
        state_param: Option<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            scope: scope.unwrap_or_default(),
            state_param: state_param.filter(|s| !s.is_empty()),
            state: Requested,
        }
    }

    /// Bind the authenticated principal
    #[must_use]
    pub fn authenticate(self, user: User) -> AuthorizationAttempt<Authenticated> {
        AuthorizationAttempt {
            client_id: self.client_id,
            redirect_uri: self.redirect_uri,
            scope: self.scope,
            state_param: self.state_param,
            state: Authenticated { user },
        }
    }
}

impl AuthorizationAttempt<Authenticated> {
    /// Principal bound to this attempt
    #[must_use]
    pub const fn user(&self) -> &User {
        &self.state.user
    }

    /// Record the persisted code
    #[must_use]
    pub fn issue_code(self, code: AuthorizationCode) -> AuthorizationAttempt<CodeIssued> {
        AuthorizationAttempt {
            client_id: self.client_id,
            redirect_uri: self.redirect_uri,
            scope: self.scope,
            state_param: self.state_param,
            state: CodeIssued { code },
        }
    }
}

impl AuthorizationAttempt<CodeIssued> {
    /// Redirect URI with `code` and, when present, `state` appended
    ///
    /// # Errors
    /// Returns `InvalidRequest` if the redirect URI is not an absolute URL
    pub fn redirect_url(&self) -> AppResult<String> {
        let mut url = Url::parse(&self.redirect_uri)
            .map_err(|e| AppError::invalid_request("Invalid redirect_uri").with_source(e))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("code", &self.state.code.code);
            if let Some(state) = &self.state_param {
                query.append_pair("state", state);
            }
        }
        Ok(url.into())
    }
}

impl<State> AuthorizationAttempt<State> {
    /// Client identifier
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Requested scope, empty when none was given
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }
}
