//! Crate-wide error type for startup, storage and administration paths.
//!
//! The login path does not surface these directly: the orchestrator folds
//! every collaborator failure into `LoginError::Internal`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthServiceError {
    /// Any failure from the compiled-in sqlx backend, flattened to text so
    /// the type does not depend on the backend feature.
    #[error("database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rejected input, such as a duplicate email or bad hash parameters.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for AuthServiceError {
    fn from(e: sqlx::Error) -> Self {
        AuthServiceError::Database(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuthServiceError>;
