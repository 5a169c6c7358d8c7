//! Configuration module for environment variables and application settings

use anyhow::{Context, Result, anyhow};
use std::env;
use std::str::FromStr;

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24 * 7;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:3001";

/// Application configuration, loaded once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    /// Token signing configuration
    pub auth: AuthConfig,

    /// Database configuration. `None` selects the in-memory store.
    pub database: Option<DatabaseConfig>,

    /// Server configuration
    pub server: ServerConfig,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    /// Mark the token cookie `Secure; SameSite=None`. Turn off for plain-HTTP local setups.
    pub cookie_secure: bool,
}

// Keep the secret out of logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub tls: bool,
    pub max_connections: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow!("JWT_SECRET environment variable is required"))?;

        let token_ttl_hours = parse_or(&lookup, "JWT_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS)?;
        if token_ttl_hours <= 0 {
            anyhow::bail!("JWT_TTL_HOURS must be positive, got {token_ttl_hours}");
        }

        let database = match lookup("DATABASE_URL").filter(|s| !s.trim().is_empty()) {
            Some(url) => Some(DatabaseConfig {
                url,
                tls: parse_or(&lookup, "DATABASE_TLS", false)?,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 16)?,
            }),
            None => None,
        };

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            auth: AuthConfig {
                jwt_secret,
                token_ttl_hours,
                cookie_secure: parse_or(&lookup, "COOKIE_SECURE", true)?,
            },
            database,
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "PORT", 3001)?,
                cors_origins,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}
