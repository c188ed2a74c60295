// ABOUTME: Cryptography module for token signing, password hashing, and secure randomness
// ABOUTME: Centralizes every cryptographic primitive the authorization server relies on
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

//! Cryptographic primitives for taskgate

/// Salted adaptive password hashing (bcrypt)
pub mod password;
/// Secure random opaque strings
pub mod random;
/// HMAC-SHA256 signing primitive for compact tokens
pub mod signing;

pub use password::PasswordHasher;
pub use random::generate_random_string;
pub use signing::{sign, SigningKey};
