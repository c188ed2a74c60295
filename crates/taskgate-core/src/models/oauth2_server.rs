// ABOUTME: Authorization code and access token persistence records
// ABOUTME: Both expire at an absolute timestamp and are swept once dead
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Single-use authorization code bound to a principal, client, and scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode {
    /// Random opaque code value (unique)
    pub code: String,
    /// Principal that authenticated
    pub user_id: Uuid,
    /// Client that requested the code
    pub client_id: String,
    /// Space-separated granted scope
    pub scope: String,
    /// When this code stops being exchangeable
    pub expires_at: DateTime<Utc>,
    /// When this code was issued
    pub created_at: DateTime<Utc>,
}

impl AuthorizationCode {
    /// Whether the code can still be exchanged at `now`
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Persisted record of an issued signed access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The signed token string itself (lookup key)
    pub token: String,
    /// Principal the token was issued to
    pub user_id: Uuid,
    /// Client the token was issued through
    pub client_id: String,
    /// Space-separated granted scope
    pub scope: String,
    /// When this record stops authorizing requests
    pub expires_at: DateTime<Utc>,
    /// When this token was issued
    pub created_at: DateTime<Utc>,
}

impl AccessToken {
    /// Whether the record still authorizes requests at `now`
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}
