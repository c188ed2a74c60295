// ABOUTME: Protocol constants and default lifetimes for the authorization server
// ABOUTME: Organized by domain so callers import only what they use
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

/// OAuth 2.0 protocol strings and lifetimes
pub mod oauth;

/// Service identity used by logging and startup output
pub mod service_names {
    /// Name of the server binary and log target
    pub const TASKGATE_SERVER: &str = "taskgate";
}
