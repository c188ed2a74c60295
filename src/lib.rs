// ABOUTME: Main library entry point for the taskgate authorization server
// ABOUTME: OAuth 2.0 authorization codes exchanged for HMAC-signed bearer tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

#![deny(unsafe_code)]

//! # Taskgate
//!
//! Issues and verifies bearer credentials for a task API. A client walks the
//! OAuth 2.0 authorization-code flow, exchanges the single-use code for a
//! compact HMAC-SHA256 signed token, and presents that token on every
//! protected request.
//!
//! ## Architecture
//!
//! - **crypto**: signing primitive, password hashing, secure randomness
//! - **auth**: credential issuer (mint and verify signed tokens)
//! - **oauth2_server**: authorization flow manager
//! - **middleware**: request authorizer and scope gating
//! - **database**: repository traits with `SQLite` and in-memory stores
//! - **routes**: axum HTTP surface
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskgate::config::ServerConfig;
//! use taskgate::database::InMemoryStore;
//! use taskgate::resources::ServerResources;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Arc::new(ServerConfig::from_env()?);
//!     let resources = Arc::new(ServerResources::new(Arc::new(InMemoryStore::new()), config));
//!     let port = resources.config.http_port;
//!     taskgate::server::run(resources, port).await
//! }
//! ```

/// Credential issuer for signed access tokens
pub mod auth;

/// Environment configuration
pub mod config;

/// Protocol constants
pub mod constants;

/// Cryptographic primitives
pub mod crypto;

/// Storage traits and backends
pub mod database;

/// Unified error handling
pub mod errors;

/// Structured logging
pub mod logging;

/// Request authorization middleware
pub mod middleware;

/// Persistence records
pub mod models;

/// OAuth 2.0 authorization flow
pub mod oauth2_server;

/// Shared server resources
pub mod resources;

/// HTTP routes
pub mod routes;

/// Server lifecycle
pub mod server;
