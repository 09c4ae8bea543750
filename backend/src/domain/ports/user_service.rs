//! Driving port used by HTTP handlers to manage users.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{User, UserChanges, UserId};

/// Failures surfaced by [`UserService`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserServiceError {
    /// Input failed domain validation.
    #[error("{0}")]
    Validation(String),
    /// The addressed user does not exist.
    #[error("user not found")]
    NotFound,
    /// The store failed; the message is safe to return to clients.
    #[error("{0}")]
    Persistence(String),
}

impl UserServiceError {
    /// Whether the failure is a missing user.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// User management use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    /// Validate and store a new user.
    async fn create_user(&self, email: String, name: String) -> Result<User, UserServiceError>;

    /// Fetch a single user.
    async fn get_user(&self, id: UserId) -> Result<User, UserServiceError>;

    /// List all users, most recent first.
    async fn list_users(&self) -> Result<Vec<User>, UserServiceError>;

    /// Apply a coalesce-if-empty partial update.
    async fn update_user(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<User, UserServiceError>;

    /// Delete a user.
    async fn delete_user(&self, id: UserId) -> Result<(), UserServiceError>;
}
