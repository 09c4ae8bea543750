//! HTTP server configuration object and helpers.

use std::time::Duration;

use users_api::outbound::persistence::{DEFAULT_QUERY_TIMEOUT, DbPool};

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: (String, u16),
    pub(crate) db_pool: DbPool,
    pub(crate) query_timeout: Duration,
    pub(crate) shutdown_grace: Duration,
}

impl ServerConfig {
    /// Construct a server configuration bound to `bind_addr` and backed by
    /// `db_pool`.
    #[must_use]
    pub fn new(bind_addr: (String, u16), db_pool: DbPool) -> Self {
        Self {
            bind_addr,
            db_pool,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            shutdown_grace: Duration::from_secs(30),
        }
    }

    /// Bound each store call.
    #[must_use]
    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    /// Time allowed for in-flight requests once shutdown starts.
    #[must_use]
    pub fn with_shutdown_grace(mut self, shutdown_grace: Duration) -> Self {
        self.shutdown_grace = shutdown_grace;
        self
    }
}
