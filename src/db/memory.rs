//! In-process user store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use super::traits::UserStore;
use super::user::{NewUser, User};
use crate::{AuthServiceError, Result};

/// User store held in memory, keyed by email.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
    next_id: AtomicU64,
}

impl MemoryUserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user. Fails if the email is taken.
    pub fn insert(&self, new_user: NewUser) -> Result<User> {
        let mut users = self
            .users
            .write()
            .map_err(|_| AuthServiceError::Database("user store lock poisoned".to_string()))?;

        if users.contains_key(&new_user.email) {
            return Err(AuthServiceError::Validation(format!(
                "email already registered: {}",
                new_user.email
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let user = User {
            id: id.to_string(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            is_active: new_user.is_active,
            created_at: Utc::now(),
        };
        users.insert(user.email.clone(), user.clone());
        Ok(user)
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users.read().map(|users| users.len()).unwrap_or(0)
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self
            .users
            .read()
            .map_err(|_| AuthServiceError::Database("user store lock poisoned".to_string()))?;
        Ok(users.get(email).cloned())
    }
}
