//! Domain service implementing the [`UserService`] driving port.
//!
//! Owns input validation and the translation of store failures into
//! [`UserServiceError`] variants. Store errors are logged here so adapters
//! only render the outcome.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::domain::ports::{UserPersistenceError, UserRepository, UserService, UserServiceError};
use crate::domain::{NewUser, User, UserChanges, UserId};

/// [`UserService`] backed by a [`UserRepository`].
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
///
/// use users_api::domain::UserServiceImpl;
/// use users_api::domain::ports::UserRepository;
///
/// fn build(repository: Arc<dyn UserRepository>) -> UserServiceImpl {
///     UserServiceImpl::new(repository)
/// }
/// ```
#[derive(Clone)]
pub struct UserServiceImpl {
    repository: Arc<dyn UserRepository>,
}

impl UserServiceImpl {
    /// Create a service over the given repository.
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }
}

fn map_persistence_error(error: UserPersistenceError) -> UserServiceError {
    match error {
        UserPersistenceError::NotFound => UserServiceError::NotFound,
        other => UserServiceError::Persistence(other.to_string()),
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn create_user(&self, email: String, name: String) -> Result<User, UserServiceError> {
        let new_user = NewUser::try_new(email, name)
            .map_err(|err| UserServiceError::Validation(err.to_string()))?;

        let user = self.repository.create(&new_user).await.map_err(|err| {
            error!(error = %err, "failed to create user");
            map_persistence_error(err)
        })?;

        info!(user_id = %user.id, "user created successfully");
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<User, UserServiceError> {
        self.repository.find_by_id(id).await.map_err(|err| {
            if !matches!(err, UserPersistenceError::NotFound) {
                error!(user_id = %id, error = %err, "failed to get user");
            }
            map_persistence_error(err)
        })
    }

    async fn list_users(&self) -> Result<Vec<User>, UserServiceError> {
        self.repository.list_all().await.map_err(|err| {
            error!(error = %err, "failed to get all users");
            map_persistence_error(err)
        })
    }

    async fn update_user(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<User, UserServiceError> {
        let user = self.repository.update(id, &changes).await.map_err(|err| {
            if !matches!(err, UserPersistenceError::NotFound) {
                error!(user_id = %id, error = %err, "failed to update user");
            }
            map_persistence_error(err)
        })?;

        info!(user_id = %user.id, "user updated successfully");
        Ok(user)
    }

    async fn delete_user(&self, id: UserId) -> Result<(), UserServiceError> {
        self.repository.delete(id).await.map_err(|err| {
            if !matches!(err, UserPersistenceError::NotFound) {
                error!(user_id = %id, error = %err, "failed to delete user");
            }
            map_persistence_error(err)
        })?;

        info!(user_id = %id, "user deleted successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Service behaviour against a mocked repository.
    use super::*;
    use crate::domain::ports::MockUserRepository;
    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};

    #[fixture]
    fn ada() -> User {
        let at = Utc
            .with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
            .single()
            .expect("valid fixture timestamp");
        User {
            id: UserId::new(1),
            email: "ada@example.com".to_owned(),
            name: "Ada".to_owned(),
            created_at: at,
            updated_at: at,
        }
    }

    fn service(repository: MockUserRepository) -> UserServiceImpl {
        UserServiceImpl::new(Arc::new(repository))
    }

    #[rstest]
    #[case("", "Ada")]
    #[case("ada@example.com", "")]
    #[tokio::test]
    async fn create_rejects_missing_fields_without_touching_store(
        #[case] email: &str,
        #[case] name: &str,
    ) {
        let mut repository = MockUserRepository::new();
        repository.expect_create().never();

        let err = service(repository)
            .create_user(email.to_owned(), name.to_owned())
            .await
            .expect_err("validation should fail");

        assert_eq!(
            err,
            UserServiceError::Validation("email and name are required".to_owned())
        );
    }

    #[rstest]
    #[tokio::test]
    async fn create_returns_stored_user(ada: User) {
        let mut repository = MockUserRepository::new();
        let stored = ada.clone();
        repository
            .expect_create()
            .withf(|new_user| new_user.email() == "ada@example.com" && new_user.name() == "Ada")
            .times(1)
            .returning(move |_| Ok(stored.clone()));

        let user = service(repository)
            .create_user("ada@example.com".to_owned(), "Ada".to_owned())
            .await
            .expect("create succeeds");

        assert_eq!(user, ada);
    }

    #[rstest]
    #[tokio::test]
    async fn get_maps_missing_rows_to_not_found() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_find_by_id()
            .returning(|_| Err(UserPersistenceError::not_found()));

        let err = service(repository)
            .get_user(UserId::new(99))
            .await
            .expect_err("missing user");

        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "user not found");
    }

    #[rstest]
    #[case(UserPersistenceError::connection("pool timed out"))]
    #[case(UserPersistenceError::query("database error"))]
    #[tokio::test]
    async fn list_maps_store_failures_to_persistence(#[case] failure: UserPersistenceError) {
        let mut repository = MockUserRepository::new();
        let expected = failure.to_string();
        repository
            .expect_list_all()
            .returning(move || Err(failure.clone()));

        let err = service(repository)
            .list_users()
            .await
            .expect_err("store failure");

        assert_eq!(err, UserServiceError::Persistence(expected));
    }

    #[rstest]
    #[tokio::test]
    async fn update_forwards_coalesced_changes(ada: User) {
        let mut repository = MockUserRepository::new();
        let mut renamed = ada.clone();
        renamed.name = "Countess".to_owned();
        let returned = renamed.clone();
        repository
            .expect_update()
            .withf(|id, changes| {
                id.get() == 1 && changes.email().is_none() && changes.name() == Some("Countess")
            })
            .times(1)
            .returning(move |_, _| Ok(returned.clone()));

        let user = service(repository)
            .update_user(
                UserId::new(1),
                UserChanges::new(Some(String::new()), Some("Countess".to_owned())),
            )
            .await
            .expect("update succeeds");

        assert_eq!(user, renamed);
    }

    #[rstest]
    #[tokio::test]
    async fn delete_reports_missing_user() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_delete()
            .returning(|_| Err(UserPersistenceError::not_found()));

        let err = service(repository)
            .delete_user(UserId::new(5))
            .await
            .expect_err("missing user");

        assert!(err.is_not_found());
    }
}
