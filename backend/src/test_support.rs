//! Test doubles shared by unit tests (in `src/`) and integration tests (in
//! `tests/`).
//!
//! Compiled for `cfg(test)` and behind the `test-support` feature.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{NewUser, User, UserChanges, UserId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Settable clock for deterministic timestamps.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *lock(&self.0) += TimeDelta::seconds(seconds);
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0)
    }
}

#[derive(Default)]
struct Store {
    next_id: i64,
    users: Vec<User>,
    outage: Option<UserPersistenceError>,
}

/// `UserRepository` holding users in memory.
///
/// Ids start at 1 and are never reused. [`Self::set_outage`] makes every call
/// fail, which stands in for an unreachable database.
pub struct InMemoryUserRepository {
    clock: Arc<dyn Clock>,
    store: Mutex<Store>,
}

impl InMemoryUserRepository {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            store: Mutex::new(Store::default()),
        }
    }

    /// Fail every subsequent call with `error`, or recover with `None`.
    pub fn set_outage(&self, error: Option<UserPersistenceError>) {
        lock(&self.store).outage = error;
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        lock(&self.store).users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn open(&self) -> Result<MutexGuard<'_, Store>, UserPersistenceError> {
        let store = lock(&self.store);
        match &store.outage {
            Some(error) => Err(error.clone()),
            None => Ok(store),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, new_user: &NewUser) -> Result<User, UserPersistenceError> {
        let mut store = self.open()?;
        let now = self.clock.utc();
        store.next_id += 1;
        let user = User {
            id: UserId::new(store.next_id),
            email: new_user.email().to_owned(),
            name: new_user.name().to_owned(),
            created_at: now,
            updated_at: now,
        };
        store.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<User, UserPersistenceError> {
        let store = self.open()?;
        store
            .users
            .iter()
            .find(|user| user.id == id)
            .cloned()
            .ok_or(UserPersistenceError::NotFound)
    }

    async fn list_all(&self) -> Result<Vec<User>, UserPersistenceError> {
        let store = self.open()?;
        let mut users = store.users.clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }

    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<User, UserPersistenceError> {
        let mut store = self.open()?;
        let now = self.clock.utc();
        let user = store
            .users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or(UserPersistenceError::NotFound)?;
        changes.apply_to(user, now);
        Ok(user.clone())
    }

    async fn delete(&self, id: UserId) -> Result<(), UserPersistenceError> {
        let mut store = self.open()?;
        let before = store.users.len();
        store.users.retain(|user| user.id != id);
        if store.users.len() == before {
            return Err(UserPersistenceError::NotFound);
        }
        Ok(())
    }
}
