// ABOUTME: Credential issuer that mints and verifies HMAC-signed compact bearer tokens
// ABOUTME: Signature is checked over header.payload before any payload field is trusted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

//! # Credential Issuer
//!
//! Tokens are three dot-joined base64url (unpadded) segments:
//! `header.payload.signature`, where the signature is HMAC-SHA256 over the
//! first two encoded segments. Verification is store-independent; the
//! request authorizer adds the liveness check against persisted records.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::crypto::{generate_random_string, SigningKey};
use crate::errors::{AppError, AppResult};
use taskgate_core::constants::oauth::{TOKEN_ALG_HS256, TOKEN_ID_BYTES, TOKEN_TYP_JWT};
use taskgate_core::models::User;

/// Precise reason a presented token was rejected
///
/// Only ever logged; callers outside this module see a uniform
/// [`crate::errors::ErrorCode::InvalidToken`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Wrong segment count, undecodable segment, or unexpected header
    #[error("Malformed token: {details}")]
    MalformedToken {
        /// What was wrong with the structure
        details: String,
    },
    /// Signature does not match header and payload
    #[error("Token signature is invalid")]
    InvalidSignature,
    /// `exp` has passed
    #[error("Token expired at {expired_at}")]
    Expired {
        /// Embedded expiry
        expired_at: DateTime<Utc>,
    },
    /// `nbf` is still in the future
    #[error("Token not valid before {not_before}")]
    NotYetValid {
        /// Embedded not-before
        not_before: DateTime<Utc>,
    },
    /// `sub` is absent or not a principal identifier
    #[error("Token subject is missing or malformed")]
    InvalidSubject,
}

impl TokenError {
    fn malformed(details: impl Into<String>) -> Self {
        Self::MalformedToken {
            details: details.into(),
        }
    }
}

/// Token header segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    /// Signature algorithm tag
    pub alg: String,
    /// Token type tag
    pub typ: String,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            alg: TOKEN_ALG_HS256.to_owned(),
            typ: TOKEN_TYP_JWT.to_owned(),
        }
    }
}

/// Token payload segment as written by [`CredentialIssuer::issue`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Principal identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Principal email
    #[serde(default)]
    pub email: String,
    /// Space-separated granted scope
    #[serde(default)]
    pub scope: String,
    /// Issuer
    #[serde(default)]
    pub iss: String,
    /// Audience
    #[serde(default)]
    pub aud: String,
    /// Expiry, Unix seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Issued at, Unix seconds
    #[serde(default)]
    pub iat: i64,
    /// Not before, Unix seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    /// Random token identifier; keeps tokens minted in the same second distinct
    #[serde(default)]
    pub jti: String,
}

/// Verified claim set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claims {
    /// Principal the token was issued to
    pub principal_id: Uuid,
    /// Principal email at issuance
    pub email: String,
    /// Space-separated granted scope
    pub scope: String,
}

/// Freshly minted token plus the expiry embedded in it
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Signed compact token
    pub token: String,
    /// Embedded `exp`, used verbatim for the persisted record
    pub expires_at: DateTime<Utc>,
    /// Issuance instant
    pub issued_at: DateTime<Utc>,
}

/// Mints and verifies signed access tokens
///
/// The signing secret is injected at construction and never read from
/// global state, so tests can run side by side with different secrets.
#[derive(Debug, Clone)]
pub struct CredentialIssuer {
    key: SigningKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl CredentialIssuer {
    /// Build an issuer from the token settings
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            key: SigningKey::new(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl: config.expiration,
        }
    }

    /// Access token lifetime
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a token for `user` with `scope`, valid from now for the configured TTL
    ///
    /// # Errors
    /// Returns an error if a segment cannot be serialized
    pub fn issue(&self, user: &User, scope: &str) -> AppResult<IssuedToken> {
        self.issue_at(user, scope, Utc::now())
    }

    /// [`Self::issue`] with an explicit issuance instant
    ///
    /// # Errors
    /// Returns an error if a segment cannot be serialized
    pub fn issue_at(&self, user: &User, scope: &str, now: DateTime<Utc>) -> AppResult<IssuedToken> {
        // Whole seconds so the persisted record matches the embedded claim
        let issued_at = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        let expires_at = issued_at + self.ttl;

        let payload = TokenPayload {
            sub: Some(user.id.to_string()),
            email: user.email.clone(),
            scope: scope.to_owned(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: Some(expires_at.timestamp()),
            iat: issued_at.timestamp(),
            nbf: Some(issued_at.timestamp()),
            jti: generate_random_string(TOKEN_ID_BYTES)?,
        };

        let header_b64 = encode_segment(&TokenHeader::default())?;
        let payload_b64 = encode_segment(&payload)?;
        let signing_input = format!("{header_b64}.{payload_b64}");
        let signature = self.key.sign(&signing_input);

        Ok(IssuedToken {
            token: format!("{signing_input}.{signature}"),
            expires_at,
            issued_at,
        })
    }

    /// Verify `token` against the current time
    ///
    /// # Errors
    /// Returns the precise [`TokenError`] for the first check that fails
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// [`Self::verify`] against an explicit instant
    ///
    /// # Errors
    /// Returns the precise [`TokenError`] for the first check that fails
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [header_b64, payload_b64, signature_b64] = segments.as_slice() else {
            return Err(TokenError::malformed(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        };

        // Nothing below this line runs for a forged token
        if !self
            .key
            .verify(&format!("{header_b64}.{payload_b64}"), signature_b64)
        {
            return Err(TokenError::InvalidSignature);
        }

        let header: TokenHeader = decode_segment(header_b64, "header")?;
        if header.alg != TOKEN_ALG_HS256 {
            return Err(TokenError::malformed(format!(
                "unsupported alg {}",
                header.alg
            )));
        }

        let payload: TokenPayload = decode_segment(payload_b64, "payload")?;

        if let Some(exp) = payload.exp {
            let expired_at = timestamp(exp)?;
            if expired_at <= now {
                return Err(TokenError::Expired { expired_at });
            }
        }

        if let Some(nbf) = payload.nbf {
            let not_before = timestamp(nbf)?;
            if not_before > now {
                return Err(TokenError::NotYetValid { not_before });
            }
        }

        let principal_id = payload
            .sub
            .as_deref()
            .and_then(|sub| Uuid::parse_str(sub).ok())
            .ok_or(TokenError::InvalidSubject)?;

        Ok(Claims {
            principal_id,
            email: payload.email,
            scope: payload.scope,
        })
    }

    /// Whether `claims` grant exactly the `required` scope tag
    #[must_use]
    pub fn has_scope(claims: &Claims, required: &str) -> bool {
        !required.is_empty() && claims.scope.split(' ').any(|granted| granted == required)
    }
}

fn encode_segment<T: Serialize>(value: &T) -> AppResult<String> {
    let json = serde_json::to_vec(value)
        .map_err(|e| AppError::internal("Failed to encode token segment").with_source(e))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: for<'de> Deserialize<'de>>(
    segment: &str,
    name: &str,
) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| TokenError::malformed(format!("{name} is not base64url: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| TokenError::malformed(format!("{name} is not valid JSON: {e}")))
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>, TokenError> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| TokenError::malformed("timestamp out of range"))
}
