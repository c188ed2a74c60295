// ABOUTME: Structured error types for store operations
// ABOUTME: Wraps sqlx failures and always surfaces them as StoreUnavailable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

use super::{AppError, ErrorCode};
use thiserror::Error;

/// Errors raised by a persistence backend
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Connection or pool failure
    #[error("Database connection failed: {context}")]
    ConnectionError {
        /// What was being attempted
        context: String,
    },

    /// Schema migration failed
    #[error("Database migration failed: {context}")]
    MigrationError {
        /// What was being attempted
        context: String,
    },

    /// A unique constraint rejected the write
    #[error("Duplicate {entity}: {field}")]
    Duplicate {
        /// Table or record type
        entity: &'static str,
        /// Offending column
        field: &'static str,
    },

    /// A stored row could not be decoded into a model
    #[error("Corrupt {entity} row: {details}")]
    InvalidRow {
        /// Table or record type
        entity: &'static str,
        /// Decoding failure
        details: String,
    },

    /// Raw sqlx error
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl From<DatabaseError> for AppError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::Duplicate { entity, field } => Self::new(
                ErrorCode::ResourceAlreadyExists,
                format!("A {entity} with this {field} already exists"),
            ),
            other => Self::store_unavailable("Storage backend unavailable").with_source(other),
        }
    }
}
