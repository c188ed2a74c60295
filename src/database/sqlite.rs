// ABOUTME: SQLite store on a sqlx pool with schema migration and atomic code consumption
// ABOUTME: Timestamps are stored as Unix milliseconds, identifiers as TEXT
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

use super::{AccessTokenRepository, AuthCodeRepository, DatabaseError, UserRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use taskgate_core::models::{AccessToken, AuthorizationCode, User};
use tracing::{debug, info};
use uuid::Uuid;

const AUTH_CODE_COLUMNS: &str = "code, user_id, client_id, scope, expires_at, created_at";
const ACCESS_TOKEN_COLUMNS: &str = "token, user_id, client_id, scope, expires_at, created_at";

/// `SQLite`-backed store
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to `database_url` and run migrations
    ///
    /// File databases are created when missing. In-memory databases are
    /// pinned to a single long-lived connection so every query sees the
    /// same data.
    ///
    /// # Errors
    /// Returns an error if the connection or a migration fails
    pub async fn connect(database_url: &str) -> Result<Self, DatabaseError> {
        let in_memory = database_url.contains(":memory:");

        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(database_url)
                .await
        } else {
            let url = if database_url.contains('?') {
                database_url.to_owned()
            } else {
                format!("{database_url}?mode=rwc")
            };
            SqlitePoolOptions::new().connect(&url).await
        }
        .map_err(|e| DatabaseError::ConnectionError {
            context: e.to_string(),
        })?;

        let store = Self { pool };
        store.migrate().await?;

        info!(in_memory, "SQLite store ready");
        Ok(store)
    }

    /// Underlying pool, for health checks
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables and indexes if they do not exist
    ///
    /// # Errors
    /// Returns an error if any DDL statement fails
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        let statements = [
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS authorization_codes (
                code TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                client_id TEXT NOT NULL,
                scope TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS access_tokens (
                token TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                client_id TEXT NOT NULL,
                scope TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)",
            "CREATE INDEX IF NOT EXISTS idx_authorization_codes_expires_at ON authorization_codes(expires_at)",
            "CREATE INDEX IF NOT EXISTS idx_access_tokens_expires_at ON access_tokens(expires_at)",
            "CREATE INDEX IF NOT EXISTS idx_access_tokens_user_id ON access_tokens(user_id)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DatabaseError::MigrationError {
                    context: e.to_string(),
                })?;
        }

        debug!("SQLite migrations applied");
        Ok(())
    }
}

fn millis_to_datetime(entity: &'static str, millis: i64) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| DatabaseError::InvalidRow {
        entity,
        details: format!("timestamp {millis} out of range"),
    })
}

fn parse_uuid(entity: &'static str, raw: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(raw).map_err(|e| DatabaseError::InvalidRow {
        entity,
        details: format!("bad identifier {raw:?}: {e}"),
    })
}

fn row_to_user(row: &SqliteRow) -> Result<User, DatabaseError> {
    let id: String = row.try_get("id")?;
    Ok(User {
        id: parse_uuid("user", &id)?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        created_at: millis_to_datetime("user", row.try_get("created_at")?)?,
        updated_at: millis_to_datetime("user", row.try_get("updated_at")?)?,
    })
}

fn row_to_auth_code(row: &SqliteRow) -> Result<AuthorizationCode, DatabaseError> {
    let user_id: String = row.try_get("user_id")?;
    Ok(AuthorizationCode {
        code: row.try_get("code")?,
        user_id: parse_uuid("authorization_code", &user_id)?,
        client_id: row.try_get("client_id")?,
        scope: row.try_get("scope")?,
        expires_at: millis_to_datetime("authorization_code", row.try_get("expires_at")?)?,
        created_at: millis_to_datetime("authorization_code", row.try_get("created_at")?)?,
    })
}

fn row_to_access_token(row: &SqliteRow) -> Result<AccessToken, DatabaseError> {
    let user_id: String = row.try_get("user_id")?;
    Ok(AccessToken {
        token: row.try_get("token")?,
        user_id: parse_uuid("access_token", &user_id)?,
        client_id: row.try_get("client_id")?,
        scope: row.try_get("scope")?,
        expires_at: millis_to_datetime("access_token", row.try_get("expires_at")?)?,
        created_at: millis_to_datetime("access_token", row.try_get("created_at")?)?,
    })
}

/// Map a unique-constraint failure to `Duplicate`, anything else to `Sqlx`
fn map_insert_error(entity: &'static str, field: &'static str, error: sqlx::Error) -> DatabaseError {
    match &error {
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
            DatabaseError::Duplicate { entity, field }
        }
        _ => DatabaseError::Sqlx(error),
    }
}

#[async_trait]
impl UserRepository for SqliteStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, DatabaseError> {
        let user = User::new(email, password_hash);

        sqlx::query(
            "INSERT INTO users (id, email, password_hash, created_at, updated_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at.timestamp_millis())
        .bind(user.updated_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error("user", "email", e))?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        sqlx::query(
            "SELECT id, email, password_hash, created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(row_to_user)
        .transpose()
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        sqlx::query(
            "SELECT id, email, password_hash, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(row_to_user)
        .transpose()
    }
}

#[async_trait]
impl AuthCodeRepository for SqliteStore {
    async fn create_auth_code(&self, code: &AuthorizationCode) -> Result<(), DatabaseError> {
        sqlx::query(&format!(
            "INSERT INTO authorization_codes ({AUTH_CODE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
        ))
        .bind(&code.code)
        .bind(code.user_id.to_string())
        .bind(&code.client_id)
        .bind(&code.scope)
        .bind(code.expires_at.timestamp_millis())
        .bind(code.created_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error("authorization_code", "code", e))?;

        Ok(())
    }

    async fn find_live_auth_code(
        &self,
        code: &str,
        client_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AuthorizationCode>, DatabaseError> {
        sqlx::query(&format!(
            "SELECT {AUTH_CODE_COLUMNS} FROM authorization_codes \
             WHERE code = $1 AND client_id = $2 AND expires_at > $3"
        ))
        .bind(code)
        .bind(client_id)
        .bind(now.timestamp_millis())
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(row_to_auth_code)
        .transpose()
    }

    async fn delete_auth_code(&self, code: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM authorization_codes WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn consume_live_auth_code(
        &self,
        code: &str,
        client_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AuthorizationCode>, DatabaseError> {
        // One statement: the row is gone for every other caller once this returns it
        sqlx::query(&format!(
            "DELETE FROM authorization_codes \
             WHERE code = $1 AND client_id = $2 AND expires_at > $3 \
             RETURNING {AUTH_CODE_COLUMNS}"
        ))
        .bind(code)
        .bind(client_id)
        .bind(now.timestamp_millis())
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(row_to_auth_code)
        .transpose()
    }

    async fn delete_expired_auth_codes(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM authorization_codes WHERE expires_at <= $1")
            .bind(now.timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl AccessTokenRepository for SqliteStore {
    async fn create_access_token(&self, token: &AccessToken) -> Result<(), DatabaseError> {
        sqlx::query(&format!(
            "INSERT INTO access_tokens ({ACCESS_TOKEN_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
        ))
        .bind(&token.token)
        .bind(token.user_id.to_string())
        .bind(&token.client_id)
        .bind(&token.scope)
        .bind(token.expires_at.timestamp_millis())
        .bind(token.created_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error("access_token", "token", e))?;

        Ok(())
    }

    async fn find_live_access_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AccessToken>, DatabaseError> {
        sqlx::query(&format!(
            "SELECT {ACCESS_TOKEN_COLUMNS} FROM access_tokens WHERE token = $1 AND expires_at > $2"
        ))
        .bind(token)
        .bind(now.timestamp_millis())
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(row_to_access_token)
        .transpose()
    }

    async fn delete_expired_access_tokens(
        &self,
        now: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE expires_at <= $1")
            .bind(now.timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
