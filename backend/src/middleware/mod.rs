//! Request middleware.
//!
//! Purpose: define middleware components for request lifecycle concerns:
//! inbound request identifiers, trace identifiers, access logging, panic
//! recovery and CORS.
//!
//! The server stacks them outermost first as request id, trace, access log,
//! recover, CORS. Actix applies the last `wrap` outermost, so `build_app`
//! wraps them in the reverse order.

pub mod access_log;
pub mod recover;
pub mod request_id;
pub mod trace;

use actix_cors::Cors;
use actix_web::http::{Method, header};

use crate::domain::TRACE_ID_HEADER;

pub use access_log::AccessLog;
pub use recover::Recover;
pub use request_id::{InboundRequestId, REQUEST_ID_HEADER, RequestId};
pub use trace::{RequestTrace, Trace};

/// Seconds browsers may cache a preflight response.
pub const CORS_MAX_AGE_SECS: usize = 300;

/// Permissive CORS policy for the public API.
///
/// Any origin may call the API. Preflight requests are answered without
/// reaching the router.
#[must_use]
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .send_wildcard()
        .allowed_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allowed_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::LINK, header::HeaderName::from_static(TRACE_ID_HEADER)])
        .max_age(CORS_MAX_AGE_SECS)
}
