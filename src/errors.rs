// ABOUTME: Application error types re-exported from taskgate-core
// ABOUTME: Keeps `crate::errors` as the single import path inside this crate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

pub use taskgate_core::errors::*;
