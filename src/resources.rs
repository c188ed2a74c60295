// ABOUTME: Shared server resources wired once at startup and handed to every route
// ABOUTME: Holds the store, flow manager, request authorizer, and immutable configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

use std::sync::Arc;

use crate::auth::CredentialIssuer;
use crate::config::ServerConfig;
use crate::crypto::PasswordHasher;
use crate::database::Store;
use crate::middleware::RequestAuthorizer;
use crate::oauth2_server::OAuth2AuthorizationServer;

/// Components shared by all request handlers
pub struct ServerResources {
    /// Persistence backend
    pub store: Arc<dyn Store>,
    /// Authorization flow manager
    pub oauth_server: Arc<OAuth2AuthorizationServer>,
    /// Bearer token authorizer for protected routes
    pub authorizer: Arc<RequestAuthorizer>,
    /// Startup configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Build every component from `config` over `store`
    ///
    /// Both the flow manager and the authorizer get their own issuer built
    /// from the same settings, so a token minted by one verifies in the other.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: Arc<ServerConfig>) -> Self {
        let issuer = CredentialIssuer::new(&config.jwt);
        let hasher = PasswordHasher::new(config.security.bcrypt_cost);

        let oauth_server = Arc::new(OAuth2AuthorizationServer::new(
            Arc::clone(&store),
            issuer.clone(),
            hasher,
            config.oauth.clone(),
        ));
        let authorizer = Arc::new(RequestAuthorizer::new(Arc::clone(&store), issuer));

        Self {
            store,
            oauth_server,
            authorizer,
            config,
        }
    }
}
