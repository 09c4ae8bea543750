//! User data model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Validation errors raised while building user values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    InvalidId,
    MissingEmailOrName,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "user id must be a 64-bit integer"),
            Self::MissingEmailOrName => write!(f, "email and name are required"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Store-assigned user identifier.
///
/// # Examples
/// ```
/// use users_api::domain::UserId;
///
/// let id: UserId = "42".parse().expect("numeric id");
/// assert_eq!(id.get(), 42);
/// assert!("abc".parse::<UserId>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Access the raw identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl FromStr for UserId {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>()
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted application user.
///
/// ## Invariants
/// - `id` is assigned by the store and never changes.
/// - `updated_at` is refreshed on every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for inserting a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    email: String,
    name: String,
}

impl NewUser {
    /// Build insert input, rejecting blank email or name.
    ///
    /// # Examples
    /// ```
    /// use users_api::domain::NewUser;
    ///
    /// assert!(NewUser::try_new("a@b.com", "A").is_ok());
    /// assert!(NewUser::try_new("", "A").is_err());
    /// ```
    pub fn try_new(
        email: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, UserValidationError> {
        let email = email.into();
        let name = name.into();
        if email.trim().is_empty() || name.trim().is_empty() {
            return Err(UserValidationError::MissingEmailOrName);
        }
        Ok(Self { email, name })
    }

    /// Email address to store.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Display name to store.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// Partial update applied with coalesce-if-empty semantics.
///
/// Absent and empty values both leave the stored column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    email: Option<String>,
    name: Option<String>,
}

impl UserChanges {
    /// Build a change set, discarding empty values.
    ///
    /// # Examples
    /// ```
    /// use users_api::domain::UserChanges;
    ///
    /// let changes = UserChanges::new(Some(String::new()), Some("new".into()));
    /// assert_eq!(changes.email(), None);
    /// assert_eq!(changes.name(), Some("new"));
    /// ```
    #[must_use]
    pub fn new(email: Option<String>, name: Option<String>) -> Self {
        Self {
            email: email.filter(|value| !value.is_empty()),
            name: name.filter(|value| !value.is_empty()),
        }
    }

    /// Replacement email, if any.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Replacement name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Apply the changes to a stored user, stamping `updated_at`.
    ///
    /// Used by in-memory adapters; SQL adapters express the same rule with
    /// optional changeset columns.
    pub fn apply_to(&self, user: &mut User, now: DateTime<Utc>) {
        if let Some(email) = &self.email {
            user.email.clone_from(email);
        }
        if let Some(name) = &self.name {
            user.name.clone_from(name);
        }
        user.updated_at = now;
    }
}
