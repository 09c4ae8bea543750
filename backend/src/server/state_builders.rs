//! Builders for the HTTP state and its repository-backed service.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use users_api::config::{AppSettings, ConfigError};
use users_api::domain::UserServiceImpl;
use users_api::inbound::http::state::HttpState;
use users_api::outbound::persistence::{DieselUserRepository, PoolConfig};

use super::ServerConfig;

/// Translate settings into pool limits.
///
/// # Errors
///
/// Returns [`ConfigError::MissingDatabaseUrl`] when no connection string is
/// configured.
pub fn pool_config(settings: &AppSettings) -> Result<PoolConfig, ConfigError> {
    Ok(PoolConfig::new(settings.database_url()?)
        .with_max_size(settings.db_max_connections())
        .with_min_idle(Some(settings.db_min_idle()))
        .with_max_lifetime(Some(settings.db_max_lifetime())))
}

/// Wire the Diesel repository into the user service shared by all workers.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let repository = DieselUserRepository::new(config.db_pool.clone(), clock.clone())
        .with_query_timeout(config.query_timeout);
    let users = Arc::new(UserServiceImpl::new(Arc::new(repository)));
    web::Data::new(HttpState::new(users, clock))
}
