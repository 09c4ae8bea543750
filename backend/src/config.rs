//! Service configuration loaded via OrthoConfig.
//!
//! Values come from CLI flags, `USERS_API_*` environment variables, and an
//! optional configuration file. Absent optional values fall back to the
//! defaults exposed by the accessor methods.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_DB_MIN_IDLE: u32 = 5;
const DEFAULT_DB_MAX_LIFETIME_SECS: u64 = 300;
const DEFAULT_DB_QUERY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 30;

/// Configuration problems detected after loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No store connection string was supplied.
    #[error("database_url is required (set USERS_API_DATABASE_URL)")]
    MissingDatabaseUrl,
}

/// Settings for the users API process.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "USERS_API")]
pub struct AppSettings {
    /// Interface to bind.
    pub host: Option<String>,
    /// TCP port to bind.
    pub port: Option<u16>,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: Option<String>,
    /// Deployment environment label attached to startup logs.
    pub environment: Option<String>,
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    pub db_max_connections: Option<u32>,
    pub db_min_idle: Option<u32>,
    pub db_max_lifetime_secs: Option<u64>,
    /// Upper bound on a single store call.
    pub db_query_timeout_secs: Option<u64>,
    /// Grace period for in-flight requests after a termination signal.
    pub shutdown_grace_secs: Option<u64>,
}

impl AppSettings {
    /// Interface to bind, defaulting to all interfaces.
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    /// Port to bind.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// `(host, port)` pair suitable for `HttpServer::bind`.
    pub fn bind_address(&self) -> (String, u16) {
        (self.host().to_owned(), self.port())
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn environment(&self) -> &str {
        self.environment.as_deref().unwrap_or(DEFAULT_ENVIRONMENT)
    }

    /// Store connection string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDatabaseUrl`] when unset or blank.
    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingDatabaseUrl)
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    /// Idle connections kept open, never above the pool size.
    pub fn db_min_idle(&self) -> u32 {
        self.db_min_idle
            .unwrap_or(DEFAULT_DB_MIN_IDLE)
            .min(self.db_max_connections())
    }

    pub fn db_max_lifetime(&self) -> Duration {
        Duration::from_secs(
            self.db_max_lifetime_secs
                .unwrap_or(DEFAULT_DB_MAX_LIFETIME_SECS),
        )
    }

    pub fn db_query_timeout(&self) -> Duration {
        Duration::from_secs(
            self.db_query_timeout_secs
                .unwrap_or(DEFAULT_DB_QUERY_TIMEOUT_SECS),
        )
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(
            self.shutdown_grace_secs
                .unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECS),
        )
    }
}
