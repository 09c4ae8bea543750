//! Domain primitives, services, and ports.
//!
//! Purpose: define transport-agnostic types used by the HTTP and persistence
//! adapters. Keep types immutable where possible and document serialisation
//! contracts (serde) in each type's Rustdoc.
//!
//! Public surface:
//! - Error / ErrorCode — entries of the response envelope's `errors` list.
//! - TraceId — per-request correlation identifier.
//! - User, UserId, NewUser, UserChanges — the user resource.
//! - UserServiceImpl — the single [`ports::UserService`] implementation.

pub mod error;
pub mod ports;
pub mod trace_id;
pub mod user;
mod user_service;

pub use self::error::{Error, ErrorCode};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId, UNKNOWN_TRACE_ID, render_trace_id};
pub use self::user::{NewUser, User, UserChanges, UserId, UserValidationError};
pub use self::user_service::UserServiceImpl;
