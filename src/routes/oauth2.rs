// ABOUTME: OAuth 2.0 route handlers for the authorization-code flow
// ABOUTME: Authorize form, login redirect, token exchange, callback echo, registration, cleanup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

//! OAuth 2.0 routes
//!
//! Handlers translate HTTP shapes to flow manager calls and nothing else.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection, QueryRejection},
        Query, State,
    },
    http::{header::LOCATION, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use html_escape::encode_double_quoted_attribute as attr;

use crate::errors::AppError;
use crate::oauth2_server::{
    AuthorizeRequest, CallbackParams, CallbackResponse, LoginPrompt, LoginRequest,
    RegisterRequest, TokenRequest,
};
use crate::resources::ServerResources;

/// OAuth 2.0 routes implementation
pub struct OAuth2Routes;

impl OAuth2Routes {
    /// Create all OAuth 2.0 routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/oauth/authorize", get(Self::handle_authorize))
            .route("/oauth/login", post(Self::handle_login))
            .route("/oauth/token", post(Self::handle_token))
            .route("/oauth/callback", get(Self::handle_callback))
            .route("/oauth/register", post(Self::handle_register))
            .route("/oauth/cleanup", post(Self::handle_cleanup))
            .with_state(resources)
    }

    /// Validate the request and render the credential form
    async fn handle_authorize(
        State(resources): State<Arc<ServerResources>>,
        query: Result<Query<AuthorizeRequest>, QueryRejection>,
    ) -> Result<Html<String>, AppError> {
        let Query(request) = query
            .map_err(|e| AppError::invalid_request("Invalid query parameters").with_source(e))?;
        let prompt = resources.oauth_server.begin_authorization(request)?;
        Ok(Html(render_login_form(&prompt)))
    }

    /// Authenticate and redirect to the client with a fresh code
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        form: Result<Form<LoginRequest>, FormRejection>,
    ) -> Result<Response, AppError> {
        let Form(request) = form
            .map_err(|e| AppError::invalid_request("Invalid request body").with_source(e))?;
        let redirect_url = resources.oauth_server.login(request).await?;
        Ok((StatusCode::FOUND, [(LOCATION, redirect_url)]).into_response())
    }

    /// Exchange a code for an access token
    async fn handle_token(
        State(resources): State<Arc<ServerResources>>,
        form: Result<Form<TokenRequest>, FormRejection>,
    ) -> Result<Response, AppError> {
        let Form(request) = form
            .map_err(|e| AppError::invalid_request("Invalid request body").with_source(e))?;
        let response = resources.oauth_server.exchange_token(request).await?;
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Echo the delivered code so a manual client can continue the flow
    async fn handle_callback(
        Query(params): Query<CallbackParams>,
    ) -> Result<Json<CallbackResponse>, AppError> {
        let code = params
            .code
            .filter(|code| !code.is_empty())
            .ok_or_else(|| AppError::invalid_request("Authorization code is required"))?;

        Ok(Json(CallbackResponse {
            message: "Authorization successful".to_owned(),
            code,
            state: params.state.unwrap_or_default(),
            next_step: "Exchange this code for an access token using POST /oauth/token"
                .to_owned(),
        }))
    }

    /// Register a principal
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        body: Result<Json<RegisterRequest>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let Json(request) = body
            .map_err(|e| AppError::invalid_request("Invalid request body").with_source(e))?;
        let user = resources.oauth_server.register(request).await?;
        Ok((StatusCode::CREATED, Json(user)).into_response())
    }

    /// Sweep expired codes and tokens on demand
    async fn handle_cleanup(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let report = resources.oauth_server.cleanup_expired().await?;
        Ok(Json(serde_json::json!({
            "message": "Expired tokens cleaned up successfully",
            "auth_codes_removed": report.auth_codes_removed,
            "access_tokens_removed": report.access_tokens_removed,
        }))
        .into_response())
    }
}

/// Minimal credential form; every echoed value is attribute-escaped
fn render_login_form(prompt: &LoginPrompt) -> String {
    let scope = prompt.scope.as_deref().unwrap_or_default();
    let state = prompt.state.as_deref().unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Sign in</title></head>
<body>
<h1>Sign in</h1>
<p>Client <strong>{client_label}</strong> is requesting: {scope_label}</p>
<form method="post" action="/oauth/login">
<input type="hidden" name="client_id" value="{client_id}">
<input type="hidden" name="redirect_uri" value="{redirect_uri}">
<input type="hidden" name="scope" value="{scope}">
<input type="hidden" name="state" value="{state}">
<label>Email <input type="email" name="email" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Authorize</button>
</form>
</body>
</html>
"#,
        client_label = html_escape::encode_text(&prompt.client_id),
        scope_label = html_escape::encode_text(scope),
        client_id = attr(&prompt.client_id),
        redirect_uri = attr(&prompt.redirect_uri),
        scope = attr(scope),
        state = attr(state),
    )
}
