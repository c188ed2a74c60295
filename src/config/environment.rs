// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses signing, client registration, lifetime, and storage settings from env vars
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

//! Environment-based configuration management

use anyhow::{anyhow, Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use taskgate_core::constants::oauth;
use tracing::{info, warn};

use crate::errors::{AppError, AppResult};

/// Signing secret shipped as the default; only acceptable outside production
const DEFAULT_JWT_SECRET: &str = "your-super-secret-jwt-key";

/// Environment type for security-sensitive defaults
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// sqlx connection URL (`sqlite:path.db` or `sqlite::memory:`)
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:taskgate.db".to_owned(),
        }
    }
}

/// Signed token settings
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC signing secret
    pub secret: String,
    /// `iss` claim
    pub issuer: String,
    /// `aud` claim
    pub audience: String,
    /// Access token lifetime (token `exp` and store record alike)
    pub expiration: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_JWT_SECRET.to_owned(),
            issuer: "ishare-task-api".to_owned(),
            audience: "ishare-clients".to_owned(),
            expiration: Duration::hours(oauth::DEFAULT_ACCESS_TOKEN_TTL_HOURS),
        }
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// The single registered OAuth client
#[derive(Clone)]
pub struct OAuthClientConfig {
    /// Registered client identifier
    pub client_id: String,
    /// Registered client secret
    pub client_secret: String,
    /// Registered redirect URI (exact match)
    pub redirect_uri: String,
    /// Authorization code lifetime
    pub code_ttl: Duration,
}

impl Default for OAuthClientConfig {
    fn default() -> Self {
        Self {
            client_id: "test-client".to_owned(),
            client_secret: "test-secret".to_owned(),
            redirect_uri: "http://localhost:8080/oauth/callback".to_owned(),
            code_ttl: Duration::minutes(oauth::DEFAULT_AUTH_CODE_TTL_MINUTES),
        }
    }
}

impl fmt::Debug for OAuthClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("code_ttl", &self.code_ttl)
            .finish()
    }
}

/// Password hashing settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityConfig {
    /// bcrypt cost factor (4..=31)
    pub bcrypt_cost: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Complete server configuration, immutable after startup
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Storage settings
    pub database: DatabaseConfig,
    /// Signed token settings
    pub jwt: JwtConfig,
    /// Registered client
    pub oauth: OAuthClientConfig,
    /// Password hashing
    pub security: SecurityConfig,
    /// Seconds between expiry sweeps; zero disables the background sweep
    pub cleanup_interval_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but unparsable, or if the
    /// resulting configuration fails [`Self::validate`]
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let jwt_defaults = JwtConfig::default();
        let oauth_defaults = OAuthClientConfig::default();

        let config = Self {
            http_port: env_parse_or("SERVER_PORT", 8080)?,
            environment: Environment::from_str_or_default(&env_var_or(
                "ENVIRONMENT",
                "development",
            )),
            database: DatabaseConfig {
                url: env_var_or("DATABASE_URL", &DatabaseConfig::default().url),
            },
            jwt: JwtConfig {
                secret: env_var_or("JWT_SECRET", &jwt_defaults.secret),
                issuer: env_var_or("JWT_ISSUER", &jwt_defaults.issuer),
                audience: env_var_or("JWT_AUDIENCE", &jwt_defaults.audience),
                expiration: Duration::hours(env_parse_or(
                    "JWT_EXPIRATION_HOURS",
                    oauth::DEFAULT_ACCESS_TOKEN_TTL_HOURS,
                )?),
            },
            oauth: OAuthClientConfig {
                client_id: env_var_or("OAUTH_CLIENT_ID", &oauth_defaults.client_id),
                client_secret: env_var_or("OAUTH_CLIENT_SECRET", &oauth_defaults.client_secret),
                redirect_uri: env_var_or("OAUTH_REDIRECT_URI", &oauth_defaults.redirect_uri),
                code_ttl: Duration::minutes(env_parse_or(
                    "AUTH_CODE_TTL_MINUTES",
                    oauth::DEFAULT_AUTH_CODE_TTL_MINUTES,
                )?),
            },
            security: SecurityConfig {
                bcrypt_cost: env_parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            },
            cleanup_interval_secs: env_parse_or("CLEANUP_INTERVAL_SECS", 300)?,
        };

        config.validate().map_err(|e| anyhow!("{e}"))?;
        Ok(config)
    }

    /// Check cross-field invariants
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is empty, a lifetime is not positive,
    /// the bcrypt cost is out of range, or the client registration is blank
    pub fn validate(&self) -> AppResult<()> {
        if self.jwt.secret.is_empty() {
            return Err(AppError::config("JWT_SECRET must not be empty"));
        }
        if self.jwt.expiration <= Duration::zero() {
            return Err(AppError::config("JWT_EXPIRATION_HOURS must be positive"));
        }
        if self.oauth.code_ttl <= Duration::zero() {
            return Err(AppError::config("AUTH_CODE_TTL_MINUTES must be positive"));
        }
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(AppError::config(format!(
                "BCRYPT_COST must be between 4 and 31, got {}",
                self.security.bcrypt_cost
            )));
        }
        if self.oauth.client_id.is_empty() || self.oauth.redirect_uri.is_empty() {
            return Err(AppError::config(
                "OAUTH_CLIENT_ID and OAUTH_REDIRECT_URI must not be empty",
            ));
        }

        if self.jwt.secret == DEFAULT_JWT_SECRET && self.environment.is_production() {
            warn!("JWT_SECRET is the built-in default in production; set a real secret");
        }

        Ok(())
    }

    /// One-line, secret-free description for startup logs
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "taskgate: env={}, port={}, database={}, issuer={}, audience={}, token_ttl={}h, code_ttl={}m, client_id={}, cleanup_every={}s",
            self.environment,
            self.http_port,
            self.database.url,
            self.jwt.issuer,
            self.jwt.audience,
            self.jwt.expiration.num_hours(),
            self.oauth.code_ttl.num_minutes(),
            self.oauth.client_id,
            self.cleanup_interval_secs,
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, falling back to `default` when unset
fn env_parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .with_context(|| format!("Invalid {key} value: {raw:?}"))
    })
}
