//! User model.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Role assigned to accounts created without one.
pub const DEFAULT_ROLE: &str = "user";

/// A stored user account.
///
/// `password_hash` is the Argon2id record and must never leave the service;
/// use [`PublicUser`] for anything sent to a client.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: String,
    /// Login email (unique).
    pub email: String,
    /// Password hash record.
    pub password_hash: String,
    /// Role label carried into tokens.
    pub role: String,
    /// Whether the account may log in.
    pub is_active: bool,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Client-facing view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

/// New user for insertion.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    /// Already-hashed password record.
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
}

impl NewUser {
    /// Active user with the default role.
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
            role: DEFAULT_ROLE.to_string(),
            is_active: true,
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    /// Set the active flag.
    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}
