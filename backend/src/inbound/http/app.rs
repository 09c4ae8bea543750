//! Application assembly: state, middleware stack, and routes.
//!
//! The binary and the integration tests share this builder so both exercise
//! the same middleware order.

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};

use crate::inbound::http::routes::{configure, route_not_found};
use crate::inbound::http::state::HttpState;
use crate::middleware::{AccessLog, InboundRequestId, Recover, Trace, cors};

/// Build the application for one server worker.
///
/// Middleware runs outermost first as request id, trace, access log,
/// recover, CORS, then the router. Actix treats the last `wrap` as
/// outermost.
pub fn build_app(
    state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .configure(configure)
        .default_service(web::to(route_not_found))
        .wrap(cors())
        .wrap(Recover)
        .wrap(AccessLog)
        .wrap(Trace)
        .wrap(InboundRequestId)
}
