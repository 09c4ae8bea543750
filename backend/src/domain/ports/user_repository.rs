//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{NewUser, User, UserChanges, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// No user exists with the requested identifier.
        NotFound => "user not found",
        /// Repository connection could not be established or timed out.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
    }
}

/// Capability interface over the relational user store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user, returning the stored record with its assigned id.
    async fn create(&self, new_user: &NewUser) -> Result<User, UserPersistenceError>;

    /// Fetch a user by identifier.
    ///
    /// Returns [`UserPersistenceError::NotFound`] when no row matches.
    async fn find_by_id(&self, id: UserId) -> Result<User, UserPersistenceError>;

    /// List every user, most recently created first.
    async fn list_all(&self) -> Result<Vec<User>, UserPersistenceError>;

    /// Apply a partial update and return the refreshed record.
    ///
    /// Returns [`UserPersistenceError::NotFound`] when no row matches.
    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<User, UserPersistenceError>;

    /// Delete a user by identifier.
    ///
    /// Returns [`UserPersistenceError::NotFound`] when no row matches.
    async fn delete(&self, id: UserId) -> Result<(), UserPersistenceError>;
}
