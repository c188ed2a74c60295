// ABOUTME: Persistence records re-exported from taskgate-core
// ABOUTME: Principals, authorization codes, and access tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

pub use taskgate_core::models::*;
