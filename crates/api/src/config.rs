//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;

use thiserror::Error;

use messagely_auth::{AuthConfig, HashingCost};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub auth: AuthConfig,
    /// Postgres connection string; `None` selects the in-memory store.
    pub database_url: Option<String>,
}

impl AppConfig {
    pub fn new(secret: impl Into<Vec<u8>>, hashing: HashingCost) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            auth: AuthConfig::new(secret, hashing),
            database_url: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = match lookup("SECRET_KEY").or_else(|| lookup("JWT_SECRET")) {
            Some(secret) if secret.is_empty() => {
                return Err(ConfigError::Invalid {
                    key: "SECRET_KEY",
                    message: "must not be empty".to_string(),
                });
            }
            Some(secret) => secret,
            None => {
                tracing::warn!("SECRET_KEY not set; using insecure dev default");
                DEV_SECRET.to_string()
            }
        };

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                message: e.to_string(),
            })?;

        let defaults = HashingCost::default();
        let hashing = HashingCost::new(
            parse_u32(&lookup, "HASH_MEMORY_KIB", defaults.memory_kib)?,
            parse_u32(&lookup, "HASH_ITERATIONS", defaults.iterations)?,
            parse_u32(&lookup, "HASH_PARALLELISM", defaults.parallelism)?,
        );

        Ok(Self {
            bind_addr,
            auth: AuthConfig::new(secret, hashing),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
        })
    }
}

fn parse_u32<F>(lookup: &F, key: &'static str, default: u32) -> Result<u32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: std::num::ParseIntError| {
            ConfigError::Invalid {
                key,
                message: e.to_string(),
            }
        }),
    }
}
