//! HTTP inbound adapter exposing REST endpoints.

pub mod app;
pub mod envelope;
pub mod error;
pub mod health;
pub mod routes;
pub mod state;
pub mod users;

pub use error::{ApiError, ApiResult};
