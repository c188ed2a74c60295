// ABOUTME: Password verifier backed by bcrypt salted adaptive hashing
// ABOUTME: Hashing and verification run off the async executor via spawn_blocking
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

use std::sync::Arc;

use crate::errors::{AppError, AppResult};

/// Throwaway input hashed once per hasher for unknown-email logins
const TIMING_EQUALIZER_INPUT: &str = "taskgate-timing-equalizer";

/// Creates and checks salted password hashes
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
    /// Hash at `cost` verified against when a login names an unknown email,
    /// so both failure paths run the same bcrypt work factor
    timing_equalizer: Option<Arc<str>>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher {
    /// Create a hasher with the given bcrypt cost factor
    ///
    /// Hashes the timing-equalizer value once at `cost`. An out-of-range cost
    /// leaves it unset; [`Self::hash`] then fails for every password as well.
    #[must_use]
    pub fn new(cost: u32) -> Self {
        let timing_equalizer = bcrypt::hash(TIMING_EQUALIZER_INPUT, cost)
            .map_err(|e| tracing::warn!(cost, error = %e, "Cannot build timing equalizer hash"))
            .ok()
            .map(Arc::from);
        Self {
            cost,
            timing_equalizer,
        }
    }

    /// Configured cost factor
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password for storage
    ///
    /// # Errors
    /// Returns an error if the cost factor is out of range for bcrypt
    pub fn hash(&self, password: &str) -> AppResult<String> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| AppError::internal("Failed to hash password").with_source(e))
    }

    /// Check `password` against `stored_hash`
    ///
    /// A malformed stored hash is reported exactly like a wrong password.
    #[must_use]
    pub fn verify(password: &str, stored_hash: &str) -> bool {
        bcrypt::verify(password, stored_hash).unwrap_or(false)
    }

    /// [`Self::hash`] on the blocking thread pool
    ///
    /// # Errors
    /// Returns an error if hashing fails or the blocking task panics
    pub async fn hash_blocking(&self, password: String) -> AppResult<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::internal("Password hashing task failed").with_source(e))?
    }

    /// [`Self::verify`] on the blocking thread pool
    pub async fn verify_blocking(password: String, stored_hash: String) -> bool {
        tokio::task::spawn_blocking(move || Self::verify(&password, &stored_hash))
            .await
            .unwrap_or(false)
    }

    /// Equalizer hash built at the configured cost
    #[must_use]
    pub fn timing_equalizer_hash(&self) -> Option<&str> {
        self.timing_equalizer.as_deref()
    }

    /// Burn one verification at the configured cost for a login against an unknown email
    pub async fn verify_unknown_principal(&self, password: String) -> bool {
        if let Some(hash) = &self.timing_equalizer {
            Self::verify_blocking(password, hash.to_string()).await;
        }
        false
    }
}
