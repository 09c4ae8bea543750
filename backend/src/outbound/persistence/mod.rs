//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of domain repository ports backed by PostgreSQL
//! via Diesel with async support through `diesel-async` and `bb8` pooling.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types.
//! - **Internal models**: row structs (`models.rs`) and the schema
//!   (`schema.rs`) never leave this module.
//! - **Strongly typed errors**: database failures map to
//!   [`crate::domain::ports::UserPersistenceError`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mockable::DefaultClock;
//! use users_api::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! # async fn build() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/users")).await?;
//! let repo = DieselUserRepository::new(pool, Arc::new(DefaultClock));
//! # let _ = repo;
//! # Ok(())
//! # }
//! ```

mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_user_repository::{DEFAULT_QUERY_TIMEOUT, DieselUserRepository};
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
