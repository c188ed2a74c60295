// ABOUTME: Persistence abstraction for principals, authorization codes, and access tokens
// ABOUTME: Narrow repository traits with SQLite and in-memory implementations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

//! # Storage
//!
//! The store is the only shared mutable state in the service and the sole
//! source of truth for single-use and liveness checks. Each capability is a
//! small trait; [`Store`] bundles them for components that need all three.
//!
//! Every time-dependent method takes `now` explicitly so expiry is decided by
//! the caller's clock, never by the backend's.

/// In-memory backend on `DashMap`
pub mod memory;
/// `SQLite` backend on sqlx
pub mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use taskgate_core::errors::DatabaseError;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use taskgate_core::models::{AccessToken, AuthorizationCode, User};
use uuid::Uuid;

/// Principal lookup and registration
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new principal; a taken email is [`DatabaseError::Duplicate`]
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, DatabaseError>;

    /// Find a principal by exact email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    /// Find a principal by identifier
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;
}

/// Authorization code persistence with atomic single-use consumption
#[async_trait]
pub trait AuthCodeRepository: Send + Sync {
    /// Persist a freshly issued code
    async fn create_auth_code(&self, code: &AuthorizationCode) -> Result<(), DatabaseError>;

    /// Find a code issued to `client_id` that is still live at `now`, without consuming it
    async fn find_live_auth_code(
        &self,
        code: &str,
        client_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AuthorizationCode>, DatabaseError>;

    /// Delete a code unconditionally; returns whether a record was removed
    async fn delete_auth_code(&self, code: &str) -> Result<bool, DatabaseError>;

    /// Atomically find and delete a live code
    ///
    /// Of any number of concurrent calls for the same code, at most one
    /// receives `Some`.
    async fn consume_live_auth_code(
        &self,
        code: &str,
        client_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AuthorizationCode>, DatabaseError>;

    /// Delete every code whose expiry is at or before `now`; returns the count removed
    async fn delete_expired_auth_codes(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError>;
}

/// Access token record persistence
#[async_trait]
pub trait AccessTokenRepository: Send + Sync {
    /// Persist the record for a freshly minted token
    async fn create_access_token(&self, token: &AccessToken) -> Result<(), DatabaseError>;

    /// Find the record for `token` if it is still live at `now`
    async fn find_live_access_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AccessToken>, DatabaseError>;

    /// Delete every token record whose expiry is at or before `now`; returns the count removed
    async fn delete_expired_access_tokens(&self, now: DateTime<Utc>)
        -> Result<u64, DatabaseError>;
}

/// Every capability the authorization server needs from storage
pub trait Store: UserRepository + AuthCodeRepository + AccessTokenRepository {}

impl<T> Store for T where T: UserRepository + AuthCodeRepository + AccessTokenRepository {}
