// ABOUTME: OAuth 2.0 authorization-code server issuing HMAC-signed access tokens
// ABOUTME: Flow manager, request/response models, and the typestate for one attempt
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

/// Authorization flow manager
pub mod endpoints;
/// OAuth 2.0 data models and types
pub mod models;
/// Typestate pattern for compile-time flow safety
pub mod typestate;

/// OAuth 2.0 authorization server
pub use endpoints::OAuth2AuthorizationServer;

pub use models::{
    AuthorizeRequest, CallbackParams, CallbackResponse, CleanupReport, LoginPrompt, LoginRequest,
    RegisterRequest, TokenRequest, TokenResponse,
};

pub use typestate::{Authenticated, AuthorizationAttempt, CodeIssued, Requested};
