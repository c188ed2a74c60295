// ABOUTME: Protocol constants re-exported from taskgate-core
// ABOUTME: OAuth strings, token header tags, lifetimes, and service names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

pub use taskgate_core::constants::*;
