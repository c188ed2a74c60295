// ABOUTME: Core types and constants for the taskgate credential service
// ABOUTME: Foundation crate with error handling, persistence models, and protocol constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

#![deny(unsafe_code)]

//! # Taskgate Core
//!
//! Foundation crate providing shared types for the taskgate authorization
//! server. It changes rarely, so the main crate can rebuild incrementally.
//!
//! ## Modules
//!
//! - **errors**: `AppError`, `ErrorCode`, and the store-level `DatabaseError`
//! - **models**: principal, authorization code, and access token records
//! - **constants**: protocol strings and default lifetimes

/// Unified error handling with OAuth-style error codes and HTTP mapping
pub mod errors;

/// Persistence records shared by the stores and the flow manager
pub mod models;

/// Protocol constants and default lifetimes
pub mod constants;
