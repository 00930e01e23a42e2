// Application configuration
//
// Read once from the environment (after `.env` is loaded) and immutable
// afterwards.

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::jsondb::JsonDbOptions;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(String),

    #[error("invalid value '{value}' for {key}")]
    Invalid { key: String, value: String },
}

/// Which remote store backs the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    /// In-process tables; data is lost on restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: StoreBackend,
    /// Present whenever `backend` is Postgres
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub page_size: usize,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub write_timeout: Option<Duration>,
    pub backup_interval: Option<Duration>,
    pub serialize_writes: bool,
    pub slow_mutation: Duration,
}

fn parse<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { key: key.to_string(), value }),
    }
}

fn parse_bool(key: &str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match raw.as_deref().map(|value| value.trim().to_lowercase()) {
        None => Ok(default),
        Some(value) => match value.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { key: key.to_string(), value }),
        },
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok().filter(|value| !value.trim().is_empty()))
    }

    /// Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("STORE_BACKEND") {
            None => StoreBackend::Postgres,
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid { key: "STORE_BACKEND".to_string(), value })?,
        };

        let database_url = lookup("DATABASE_URL");
        if backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL".to_string()));
        }

        let page_size: usize = parse("STORE_PAGE_SIZE", lookup("STORE_PAGE_SIZE"), 1000)?;
        if page_size == 0 {
            return Err(ConfigError::Invalid { key: "STORE_PAGE_SIZE".to_string(), value: "0".to_string() });
        }

        let write_timeout = match lookup("STORE_WRITE_TIMEOUT_SECS") {
            None => None,
            Some(raw) => Some(Duration::from_secs(parse("STORE_WRITE_TIMEOUT_SECS", Some(raw), 0u64)?)),
        };
        let backup_secs: u64 = parse("BACKUP_INTERVAL_SECS", lookup("BACKUP_INTERVAL_SECS"), 300)?;

        Ok(Self {
            backend,
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse("PORT", lookup("PORT"), 8080)?,
            page_size,
            max_connections: parse("STORE_MAX_CONNECTIONS", lookup("STORE_MAX_CONNECTIONS"), 5)?,
            acquire_timeout: Duration::from_secs(parse(
                "STORE_ACQUIRE_TIMEOUT_SECS",
                lookup("STORE_ACQUIRE_TIMEOUT_SECS"),
                3,
            )?),
            write_timeout,
            backup_interval: (backup_secs > 0).then(|| Duration::from_secs(backup_secs)),
            serialize_writes: parse_bool("SERIALIZE_WRITES", lookup("SERIALIZE_WRITES"), false)?,
            slow_mutation: Duration::from_millis(parse("SLOW_MUTATION_MS", lookup("SLOW_MUTATION_MS"), 500)?),
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn store_options(&self) -> JsonDbOptions {
        JsonDbOptions {
            page_size: self.page_size,
            write_timeout: self.write_timeout,
            backup_interval: self.backup_interval,
            serialize_writes: self.serialize_writes,
            slow_mutation: self.slow_mutation,
        }
    }
}
