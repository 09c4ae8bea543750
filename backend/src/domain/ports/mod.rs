//! Domain ports defining the edges of the hexagon.
//!
//! Driving ports ([`UserService`]) are what inbound adapters call; driven
//! ports ([`UserRepository`]) are what outbound adapters implement. Each trait
//! exposes strongly typed errors so adapters map their failures into
//! predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod user_repository;
mod user_service;

#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
#[cfg(test)]
pub use user_service::MockUserService;
pub use user_service::{UserService, UserServiceError};
