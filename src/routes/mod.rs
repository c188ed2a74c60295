// ABOUTME: Route module organization for the taskgate HTTP surface
// ABOUTME: Health, OAuth 2.0 protocol endpoints, and the protected principal API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

//! HTTP routes
//!
//! Each domain module holds only route definitions and thin handlers that
//! delegate to the flow manager or the request authorizer.

/// Protected API routes
pub mod api;
/// Health check routes
pub mod health;
/// OAuth 2.0 protocol routes
pub mod oauth2;

pub use api::ApiRoutes;
pub use health::HealthRoutes;
pub use oauth2::OAuth2Routes;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::resources::ServerResources;

/// Assemble the complete application router
pub fn router(resources: &Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes())
        .merge(OAuth2Routes::routes(Arc::clone(resources)))
        .merge(ApiRoutes::routes(Arc::clone(resources)))
        .layer(TraceLayer::new_for_http())
}
