//! SQL-backed user store.

use async_trait::async_trait;

use super::traits::UserStore;
use super::user::{NewUser, User};
use super::DbPool;
use crate::{AuthServiceError, Result};

const SELECT_USER: &str = "SELECT CAST(id AS TEXT) AS id, email, password_hash, role, is_active, created_at
     FROM users";

/// User store over a sqlx connection pool.
#[derive(Debug, Clone)]
pub struct SqlUserStore {
    pool: DbPool,
}

impl SqlUserStore {
    /// Create a store over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a user and return the stored row.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        sqlx::query(
            "INSERT INTO users (email, password_hash, role, is_active)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.role)
        .bind(new_user.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthServiceError::Database(e.to_string()))?;

        self.get_by_email(&new_user.email)
            .await?
            .ok_or_else(|| AuthServiceError::NotFound("user".to_string()))
    }
}

#[async_trait]
impl UserStore for SqlUserStore {
    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthServiceError::Database(e.to_string()))?;

        Ok(user)
    }
}
