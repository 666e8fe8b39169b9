//! Server configuration read from the environment.

use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use gatehouse_crypto::Keyring;

use crate::error::AppError;

/// Where events are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// PostgreSQL at the given URL.
    Postgres(String),
    /// Process memory; lost on restart.
    Memory,
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreBackend,
    pub db_max_connections: u32,
    pub push_timeout: Duration,
    pub keyring: Keyring,
    pub otlp_endpoint: Option<String>,
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming the first missing or invalid variable.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns a variable's
    /// value or `None` when unset.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming the first missing or invalid variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let store = match lookup("GATEHOUSE_STORE").as_deref().unwrap_or("postgres") {
            "postgres" => StoreBackend::Postgres(lookup("DATABASE_URL").ok_or_else(|| {
                AppError::Config("DATABASE_URL environment variable must be set".into())
            })?),
            "memory" => StoreBackend::Memory,
            other => {
                return Err(AppError::Config(format!(
                    "GATEHOUSE_STORE must be postgres or memory, got {other}"
                )));
            }
        };

        let keys = lookup("IDP_ENCRYPTION_KEYS").ok_or_else(|| {
            AppError::Config("IDP_ENCRYPTION_KEYS environment variable must be set".into())
        })?;
        let active_key = lookup("IDP_ENCRYPTION_ACTIVE_KEY");
        let keyring = Keyring::parse(&keys, active_key.as_deref())
            .map_err(|e| AppError::Config(format!("IDP_ENCRYPTION_KEYS is invalid: {e}")))?;

        let push_timeout_ms: u64 = parsed(&lookup, "PUSH_TIMEOUT_MS", 5000)?;

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed(&lookup, "PORT", 3000)?,
            store,
            db_max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            push_timeout: Duration::from_millis(push_timeout_ms),
            keyring,
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.is_empty()),
        })
    }

    /// The socket address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when `HOST:PORT` is not a socket address.
    pub fn bind_address(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{name} is invalid: {e}"))),
    }
}
