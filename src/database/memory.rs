// ABOUTME: In-memory store backed by DashMap for tests and single-process deployments
// ABOUTME: Single-use consumption relies on DashMap::remove_if holding the shard lock
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

use super::{AccessTokenRepository, AuthCodeRepository, DatabaseError, UserRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use taskgate_core::models::{AccessToken, AuthorizationCode, User};
use uuid::Uuid;

/// `DashMap`-backed store; clones share the same maps
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    users: Arc<DashMap<Uuid, User>>,
    user_ids_by_email: Arc<DashMap<String, Uuid>>,
    auth_codes: Arc<DashMap<String, AuthorizationCode>>,
    access_tokens: Arc<DashMap<String, AccessToken>>,
}

impl InMemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of authorization codes currently held, live or not
    #[must_use]
    pub fn auth_code_count(&self) -> usize {
        self.auth_codes.len()
    }

    /// Number of access token records currently held, live or not
    #[must_use]
    pub fn access_token_count(&self) -> usize {
        self.access_tokens.len()
    }
}

/// Remove entries dead at `now`, counting them
fn sweep<V>(map: &DashMap<String, V>, is_live: impl Fn(&V) -> bool) -> u64 {
    let mut removed = 0;
    map.retain(|_, value| {
        let keep = is_live(value);
        if !keep {
            removed += 1;
        }
        keep
    });
    removed
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, DatabaseError> {
        match self.user_ids_by_email.entry(email.to_owned()) {
            Entry::Occupied(_) => Err(DatabaseError::Duplicate {
                entity: "user",
                field: "email",
            }),
            Entry::Vacant(slot) => {
                let user = User::new(email, password_hash);
                slot.insert(user.id);
                self.users.insert(user.id, user.clone());
                Ok(user)
            }
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let Some(id) = self.user_ids_by_email.get(email).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|user| user.value().clone()))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.get(&id).map(|user| user.value().clone()))
    }
}

#[async_trait]
impl AuthCodeRepository for InMemoryStore {
    async fn create_auth_code(&self, code: &AuthorizationCode) -> Result<(), DatabaseError> {
        match self.auth_codes.entry(code.code.clone()) {
            Entry::Occupied(_) => Err(DatabaseError::Duplicate {
                entity: "authorization_code",
                field: "code",
            }),
            Entry::Vacant(slot) => {
                slot.insert(code.clone());
                Ok(())
            }
        }
    }

    async fn find_live_auth_code(
        &self,
        code: &str,
        client_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AuthorizationCode>, DatabaseError> {
        Ok(self
            .auth_codes
            .get(code)
            .filter(|record| record.client_id == client_id && record.is_live(now))
            .map(|record| record.value().clone()))
    }

    async fn delete_auth_code(&self, code: &str) -> Result<bool, DatabaseError> {
        Ok(self.auth_codes.remove(code).is_some())
    }

    async fn consume_live_auth_code(
        &self,
        code: &str,
        client_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AuthorizationCode>, DatabaseError> {
        Ok(self
            .auth_codes
            .remove_if(code, |_, record| {
                record.client_id == client_id && record.is_live(now)
            })
            .map(|(_, record)| record))
    }

    async fn delete_expired_auth_codes(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        Ok(sweep(&self.auth_codes, |record| record.is_live(now)))
    }
}

#[async_trait]
impl AccessTokenRepository for InMemoryStore {
    async fn create_access_token(&self, token: &AccessToken) -> Result<(), DatabaseError> {
        match self.access_tokens.entry(token.token.clone()) {
            Entry::Occupied(_) => Err(DatabaseError::Duplicate {
                entity: "access_token",
                field: "token",
            }),
            Entry::Vacant(slot) => {
                slot.insert(token.clone());
                Ok(())
            }
        }
    }

    async fn find_live_access_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AccessToken>, DatabaseError> {
        Ok(self
            .access_tokens
            .get(token)
            .filter(|record| record.is_live(now))
            .map(|record| record.value().clone()))
    }

    async fn delete_expired_access_tokens(
        &self,
        now: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        Ok(sweep(&self.access_tokens, |record| record.is_live(now)))
    }
}
