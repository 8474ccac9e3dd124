use std::str::FromStr;

use crate::auth::jwt::{JwtConfig, MAX_EXPIRY_MINS};

/// Where users and revoked tokens are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// PostgreSQL via `DATABASE_URL` (default).
    Postgres,
    /// In-process maps; state is lost on restart. Local development only.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Invalid {
                var: "STORE_BACKEND",
                value: other.to_string(),
            }),
        }
    }
}

/// Configuration loading failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in the environment")]
    Missing(&'static str),

    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Storage backend (default: `postgres`).
    pub store_backend: StoreBackend,
    /// PostgreSQL connection string; required for the `postgres` backend.
    pub database_url: Option<String>,
    /// How often expired revocation entries are pruned (default: `3600`).
    pub revocation_prune_interval_secs: u64,
    /// Token signing configuration.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                           | Default                 |
    /// |-----------------------------------|-------------------------|
    /// | `HOST`                            | `0.0.0.0`               |
    /// | `PORT`                            | `3000`                  |
    /// | `CORS_ORIGINS`                    | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`            | `30`                    |
    /// | `STORE_BACKEND`                   | `postgres`              |
    /// | `DATABASE_URL`                    | required for postgres   |
    /// | `REVOCATION_PRUNE_INTERVAL_SECS`  | `3600`                  |
    /// | `JWT_SECRET`                      | **required**            |
    /// | `JWT_EXPIRY_MINS`                 | `1440` (1..=525600)     |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = parse_var("PORT", 3000)?;

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", 30)?;
        let store_backend = parse_var("STORE_BACKEND", StoreBackend::Postgres)?;

        let database_url = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let revocation_prune_interval_secs = parse_var("REVOCATION_PRUNE_INTERVAL_SECS", 3600)?;
        if revocation_prune_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "REVOCATION_PRUNE_INTERVAL_SECS",
                value: "0".into(),
            });
        }

        let secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let mut jwt = JwtConfig::new(secret);
        jwt.expiry_mins = check_expiry_mins(parse_var("JWT_EXPIRY_MINS", jwt.expiry_mins)?)?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            store_backend,
            database_url,
            revocation_prune_interval_secs,
            jwt,
        })
    }
}

/// Token lifetimes must be positive and at most [`MAX_EXPIRY_MINS`].
fn check_expiry_mins(mins: i64) -> Result<i64, ConfigError> {
    if (1..=MAX_EXPIRY_MINS).contains(&mins) {
        Ok(mins)
    } else {
        Err(ConfigError::Invalid {
            var: "JWT_EXPIRY_MINS",
            value: mins.to_string(),
        })
    }
}

/// Read `var` and parse it, falling back to `default` when unset.
fn parse_var<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
        Err(_) => Ok(default),
    }
}
