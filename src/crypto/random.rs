// ABOUTME: Cryptographically secure random opaque strings
// ABOUTME: Backs authorization code generation with the system RNG
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

use crate::errors::{AppError, AppResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};

/// Generate `length` random bytes and encode them as URL-safe base64
///
/// # Errors
/// Returns an error if the system RNG fails. The server cannot issue
/// credentials securely without it, so callers must not fall back.
pub fn generate_random_string(length: usize) -> AppResult<String> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; length];

    rng.fill(&mut bytes).map_err(|e| {
        tracing::error!(
            "CRITICAL: SystemRandom failed - cannot generate secure random bytes: {}",
            e
        );
        AppError::internal("System RNG failure - server cannot operate securely")
    })?;

    Ok(URL_SAFE_NO_PAD.encode(&bytes))
}
