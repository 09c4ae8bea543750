//! Users API library: domain model, HTTP adapter, middleware, and
//! PostgreSQL persistence.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use middleware::Trace;
