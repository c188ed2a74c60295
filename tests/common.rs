// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Builds configs, stores, and server resources, and walks the flow to a token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `taskgate`

use std::path::PathBuf;
use std::sync::{Arc, Once};

use taskgate::{
    config::{Environment, ServerConfig, SecurityConfig},
    database::{InMemoryStore, SqliteStore, Store},
    oauth2_server::{LoginRequest, RegisterRequest, TokenRequest, TokenResponse},
    resources::ServerResources,
};
use taskgate_core::models::PrincipalView;

static INIT_LOGGER: Once = Once::new();

pub const CLIENT_ID: &str = "test-client";
pub const CLIENT_SECRET: &str = "test-secret";
pub const REDIRECT_URI: &str = "http://localhost:8080/oauth/callback";
pub const EMAIL: &str = "user@example.com";
pub const PASSWORD: &str = "secret123";
pub const SCOPE: &str = "tasks:read tasks:write";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Configuration with the cheapest bcrypt cost and no background sweep
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig {
        http_port: 0,
        environment: Environment::Testing,
        security: SecurityConfig { bcrypt_cost: 4 },
        cleanup_interval_secs: 0,
        ..ServerConfig::default()
    };
    config.jwt.secret = "integration-test-signing-secret".to_owned();
    config.database.url = "sqlite::memory:".to_owned();
    config
}

/// Resources over a fresh in-memory store; the store handle is returned for inspection
pub fn memory_resources() -> (Arc<InMemoryStore>, Arc<ServerResources>) {
    init_test_logging();
    let store = Arc::new(InMemoryStore::new());
    let resources = Arc::new(ServerResources::new(
        Arc::clone(&store) as Arc<dyn Store>,
        Arc::new(test_config()),
    ));
    (store, resources)
}

/// Resources over a fresh `sqlite::memory:` store
pub async fn sqlite_resources() -> Arc<ServerResources> {
    init_test_logging();
    let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
    Arc::new(ServerResources::new(Arc::new(store), Arc::new(test_config())))
}

/// Resources over a fresh file-backed store with a multi-connection pool
///
/// Returns the store handle for closing and the database path for removal.
pub async fn file_sqlite_resources() -> (Arc<SqliteStore>, Arc<ServerResources>, PathBuf) {
    init_test_logging();
    let path = std::env::temp_dir().join(format!("taskgate-{}.db", uuid::Uuid::new_v4()));
    let store = Arc::new(
        SqliteStore::connect(&format!("sqlite:{}", path.display()))
            .await
            .unwrap(),
    );
    let resources = Arc::new(ServerResources::new(
        Arc::clone(&store) as Arc<dyn Store>,
        Arc::new(test_config()),
    ));
    (store, resources, path)
}

/// Register the default test principal
pub async fn register_default_user(resources: &ServerResources) -> PrincipalView {
    resources
        .oauth_server
        .register(RegisterRequest {
            email: EMAIL.to_owned(),
            password: PASSWORD.to_owned(),
        })
        .await
        .unwrap()
}

/// Login form for the default principal and registered client
pub fn login_request(scope: &str, state: Option<&str>) -> LoginRequest {
    LoginRequest {
        email: EMAIL.to_owned(),
        password: PASSWORD.to_owned(),
        client_id: CLIENT_ID.to_owned(),
        redirect_uri: REDIRECT_URI.to_owned(),
        scope: Some(scope.to_owned()),
        state: state.map(str::to_owned),
    }
}

/// Pull one query parameter out of a redirect URL
pub fn query_param(redirect_url: &str, name: &str) -> Option<String> {
    url::Url::parse(redirect_url)
        .unwrap()
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Log the default principal in and return the fresh authorization code
pub async fn login_for_code(resources: &ServerResources, scope: &str) -> String {
    let redirect = resources
        .oauth_server
        .login(login_request(scope, None))
        .await
        .unwrap();
    query_param(&redirect, "code").unwrap()
}

/// Token request for `code` with the registered client credentials
pub fn token_request(code: &str) -> TokenRequest {
    TokenRequest {
        grant_type: "authorization_code".to_owned(),
        code: Some(code.to_owned()),
        redirect_uri: Some(REDIRECT_URI.to_owned()),
        client_id: CLIENT_ID.to_owned(),
        client_secret: CLIENT_SECRET.to_owned(),
    }
}

/// Register, log in, and exchange: a ready-to-use token for `scope`
pub async fn obtain_token(resources: &ServerResources, scope: &str) -> TokenResponse {
    register_default_user(resources).await;
    let code = login_for_code(resources, scope).await;
    resources
        .oauth_server
        .exchange_token(token_request(&code))
        .await
        .unwrap()
}
