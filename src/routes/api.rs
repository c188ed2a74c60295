// ABOUTME: Protected API routes gated by bearer authentication and scope checks
// ABOUTME: Exposes the caller's own principal view as the reference protected resource
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::AppError;
use crate::middleware::{require_bearer_auth, AuthContext};
use crate::resources::ServerResources;
use taskgate_core::constants::oauth::SCOPE_TASKS_READ;
use taskgate_core::models::PrincipalView;

/// Body of `GET /api/me`
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// The authenticated principal
    pub user: PrincipalView,
    /// Scope granted to the presented token
    pub scope: String,
    /// When the presented token stops working
    pub token_expires_at: DateTime<Utc>,
}

/// Protected API routes
pub struct ApiRoutes;

impl ApiRoutes {
    /// Create all protected routes behind the bearer middleware
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/me", get(Self::handle_me))
            .route_layer(middleware::from_fn_with_state(
                Arc::clone(&resources.authorizer),
                require_bearer_auth,
            ))
    }

    /// Return the caller's principal; requires `tasks:read`
    async fn handle_me(
        Extension(context): Extension<AuthContext>,
    ) -> Result<Json<MeResponse>, AppError> {
        context.require_scope(SCOPE_TASKS_READ)?;

        Ok(Json(MeResponse {
            user: PrincipalView::from(&context.user),
            scope: context.claims.scope,
            token_expires_at: context.token.expires_at,
        }))
    }
}
