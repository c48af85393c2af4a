//! Authentication module.
//!
//! Password hashing and verification, failed-attempt throttling, session
//! tokens, cached session records and the login service tying them
//! together.

mod limiter;
mod password;
mod service;
mod session;
mod token;

pub use limiter::{AttemptLimiter, BLOCK_WINDOW_SECS, MAX_LOGIN_ATTEMPTS};
pub use password::{
    constant_time_eq, Argon2Hasher, HashParams, HashRecord, PasswordError, PasswordVerifier,
    RecordError, ALGORITHM_TAG,
};
pub use service::{AuthPolicy, AuthService, LoginError, LoginSuccess, DEFAULT_CALL_TIMEOUT_MS};
pub use session::{SessionStore, DEFAULT_SESSION_TTL_SECS};
pub use token::{
    Claims, TokenConfig, TokenError, TokenIssuer, TokenManager, DEFAULT_TOKEN_LIFETIME_SECS,
    SIGNING_ALGORITHM,
};
