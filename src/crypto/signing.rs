// ABOUTME: HMAC-SHA256 signing primitive over the encoded header.payload string
// ABOUTME: Produces and verifies base64url (unpadded) signatures with constant-time comparison
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::hmac;
use std::fmt;
use subtle::ConstantTimeEq;

/// Keyed MAC used to sign and verify compact tokens
///
/// Stateless apart from the key itself, so a single instance can be shared
/// across request handlers without coordination.
#[derive(Clone)]
pub struct SigningKey {
    key: hmac::Key,
}

impl SigningKey {
    /// Build a signing key from the raw secret bytes
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
        }
    }

    /// Sign the UTF-8 bytes of `input`, returning base64url without padding
    #[must_use]
    pub fn sign(&self, input: &str) -> String {
        let tag = hmac::sign(&self.key, input.as_bytes());
        URL_SAFE_NO_PAD.encode(tag.as_ref())
    }

    /// Recompute the signature over `input` and compare it with `signature`
    ///
    /// The comparison is on the encoded strings and runs in constant time for
    /// equal lengths.
    #[must_use]
    pub fn verify(&self, input: &str, signature: &str) -> bool {
        let expected = self.sign(input);
        expected.as_bytes().ct_eq(signature.as_bytes()).into()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &"HMAC-SHA256")
            .finish_non_exhaustive()
    }
}

/// One-shot `sign(secret, input) -> signature`
#[must_use]
pub fn sign(secret: &[u8], input: &str) -> String {
    SigningKey::new(secret).sign(input)
}
