//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Every operation, including pool checkout, runs under the configured query
//! timeout. Dropping the returned future cancels the in-flight query.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{NewUser, User, UserChanges, UserId};

use super::models::{NewUserRow, UserChangeset, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Default bound on a single store call.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
    clock: Arc<dyn Clock>,
    query_timeout: Duration,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            clock,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Override the per-call timeout.
    #[must_use]
    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, UserPersistenceError>
    where
        F: Future<Output = Result<T, UserPersistenceError>>,
    {
        bound_call(self.query_timeout, operation, call).await
    }
}

async fn bound_call<T, F>(
    limit: Duration,
    operation: &'static str,
    call: F,
) -> Result<T, UserPersistenceError>
where
    F: Future<Output = Result<T, UserPersistenceError>>,
{
    tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
        warn!(operation, timeout_ms = %limit.as_millis(), "store call timed out");
        Err(UserPersistenceError::connection(format!(
            "{operation} timed out after {}ms",
            limit.as_millis()
        )))
    })
}

/// Map pool errors to user persistence errors.
fn map_pool_error(error: PoolError) -> UserPersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            UserPersistenceError::connection(message)
        }
    }
}

/// Map Diesel errors to user persistence errors.
fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => UserPersistenceError::not_found(),
        DieselError::QueryBuilderError(_) => UserPersistenceError::query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            UserPersistenceError::connection("database connection error")
        }
        _ => UserPersistenceError::query("database error"),
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, new_user: &NewUser) -> Result<User, UserPersistenceError> {
        let now = self.clock.utc();
        let row = NewUserRow {
            email: new_user.email(),
            name: new_user.name(),
            created_at: now,
            updated_at: now,
        };

        self.bounded("create", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            diesel::insert_into(users::table)
                .values(&row)
                .returning(UserRow::as_returning())
                .get_result(&mut conn)
                .await
                .map(User::from)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn find_by_id(&self, id: UserId) -> Result<User, UserPersistenceError> {
        self.bounded("find_by_id", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<UserRow> = users::table
                .find(id.get())
                .select(UserRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
            row.map(User::from).ok_or(UserPersistenceError::NotFound)
        })
        .await
    }

    async fn list_all(&self) -> Result<Vec<User>, UserPersistenceError> {
        self.bounded("list_all", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let rows: Vec<UserRow> = users::table
                .order((users::created_at.desc(), users::id.desc()))
                .select(UserRow::as_select())
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(User::from).collect())
        })
        .await
    }

    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<User, UserPersistenceError> {
        let changeset = UserChangeset {
            email: changes.email(),
            name: changes.name(),
            updated_at: self.clock.utc(),
        };

        self.bounded("update", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<UserRow> = diesel::update(users::table.find(id.get()))
                .set(&changeset)
                .returning(UserRow::as_returning())
                .get_result(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
            row.map(User::from).ok_or(UserPersistenceError::NotFound)
        })
        .await
    }

    async fn delete(&self, id: UserId) -> Result<(), UserPersistenceError> {
        self.bounded("delete", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let affected = diesel::delete(users::table.find(id.get()))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            if affected == 0 {
                return Err(UserPersistenceError::NotFound);
            }
            Ok(())
        })
        .await
    }
}
