//! Users API entry-point: loads configuration, prepares the database, and
//! serves the REST endpoints until a termination signal arrives.

mod server;

use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use server::{ServerConfig, create_server, pool_config};
use users_api::config::AppSettings;
use users_api::outbound::persistence::{DbPool, run_migrations};

fn init_tracing(default_level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .json()
        .try_init()
        .map_err(|e| eyre!("failed to initialise tracing: {e}"))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let settings = AppSettings::load().wrap_err("failed to load configuration")?;
    init_tracing(settings.log_level())?;

    let pool_settings = pool_config(&settings)?;
    run_migrations(pool_settings.database_url())
        .await
        .wrap_err("failed to run database migrations")?;
    let pool = DbPool::new(pool_settings)
        .await
        .wrap_err("failed to connect to database")?;

    let (host, port) = settings.bind_address();
    info!(
        %host,
        port,
        environment = settings.environment(),
        "starting users API"
    );

    let config = ServerConfig::new((host, port), pool)
        .with_query_timeout(settings.db_query_timeout())
        .with_shutdown_grace(settings.shutdown_grace());
    create_server(config)
        .wrap_err("failed to start HTTP server")?
        .await
        .wrap_err("HTTP server terminated with an error")?;

    info!("server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_tracing_init_reports_an_error() {
        let _ = init_tracing("info");
        let err = init_tracing("info").expect_err("subscriber already installed");
        assert!(err.to_string().contains("failed to initialise tracing"));
    }
}
