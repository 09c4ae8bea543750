//! Server construction.

mod config;
mod state_builders;

pub use config::ServerConfig;
pub use state_builders::pool_config;

use std::time::Duration;

use actix_web::HttpServer;
use actix_web::dev::Server;
use tracing::info;

use state_builders::build_http_state;
use users_api::inbound::http::app::build_app;

/// Time a client has to send the request head.
const CLIENT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// Idle time before a keep-alive connection is closed.
const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Construct an Actix HTTP server from the provided configuration.
///
/// The returned [`Server`] must be awaited to drive the listener. Actix
/// handles SIGINT and SIGTERM: it stops accepting connections, waits up to
/// the configured grace period for in-flight requests, then closes the rest.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(config: ServerConfig) -> std::io::Result<Server> {
    let http_state = build_http_state(&config);
    let ServerConfig {
        bind_addr,
        shutdown_grace,
        ..
    } = config;

    let server = HttpServer::new(move || build_app(http_state.clone()))
        .client_request_timeout(CLIENT_REQUEST_TIMEOUT)
        .keep_alive(KEEP_ALIVE)
        .shutdown_timeout(shutdown_grace.as_secs())
        .bind(&bind_addr)?;

    info!(
        addresses = ?server.addrs(),
        grace_secs = shutdown_grace.as_secs(),
        "listening"
    );
    Ok(server.run())
}
