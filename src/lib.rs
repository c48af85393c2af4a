//! Email/password authentication service.
//!
//! Verifies credentials against Argon2id hash records, throttles repeated
//! failures per client and issues HS256 session tokens backed by a cached
//! session record.

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod web;

pub use auth::{
    Argon2Hasher, AuthPolicy, AuthService, Claims, HashParams, LoginError, LoginSuccess,
    TokenConfig, TokenManager,
};
pub use cache::{Cache, CacheError, MemoryCache};
pub use config::Config;
pub use db::{Database, MemoryUserStore, NewUser, PublicUser, SqlUserStore, User, UserStore};
pub use error::{AuthServiceError, Result};
pub use web::{AppState, WebServer};
