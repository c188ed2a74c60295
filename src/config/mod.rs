// ABOUTME: Configuration management module for the authorization server
// ABOUTME: Loads startup settings once from the environment; immutable afterwards
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

//! Configuration module for taskgate
//!
//! All settings are read once at startup by
//! [`environment::ServerConfig::from_env`] and then handed to components by
//! value. Nothing reads configuration from ambient global state.

/// Environment and server configuration
pub mod environment;

pub use environment::{
    DatabaseConfig, Environment, JwtConfig, OAuthClientConfig, SecurityConfig, ServerConfig,
};
