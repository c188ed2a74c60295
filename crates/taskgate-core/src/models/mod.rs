// ABOUTME: Persistence records for principals, authorization codes, and access tokens
// ABOUTME: Shared between the store implementations and the authorization flow
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

/// Authorization code and access token records
pub mod oauth2_server;
/// Principal (user) records
pub mod user;

pub use oauth2_server::{AccessToken, AuthorizationCode};
pub use user::{PrincipalView, User};
