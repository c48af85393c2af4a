//! Login orchestration.
//!
//! [`AuthService::authenticate`] runs a fixed sequence: attempt check, user
//! lookup, active check, password check, counter reset, token issue and
//! session write. Each step either continues or ends the request with one
//! [`LoginError`]. Counter and session writes are best-effort and never
//! change an outcome already decided.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::limiter::{AttemptLimiter, BLOCK_WINDOW_SECS, MAX_LOGIN_ATTEMPTS};
use super::password::PasswordVerifier;
use super::session::{SessionStore, DEFAULT_SESSION_TTL_SECS};
use super::token::TokenIssuer;
use crate::cache::Cache;
use crate::db::{PublicUser, User, UserStore};

/// Default deadline for a single store or cache call.
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 3000;

/// Login policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthPolicy {
    /// Failures at which a client is refused.
    pub max_attempts: i64,
    /// How long a client's failure count lives after its latest failure.
    pub block_window: Duration,
    /// TTL of the cached session record.
    pub session_ttl: Duration,
    /// Deadline for each user store and cache call.
    pub call_timeout: Duration,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_LOGIN_ATTEMPTS,
            block_window: Duration::from_secs(BLOCK_WINDOW_SECS),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            call_timeout: Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS),
        }
    }
}

/// Why a login was refused.
///
/// `InvalidCredentials` covers both an unknown email and a wrong password
/// and must stay a single outward kind.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginError {
    /// The client reached the failure threshold inside the block window.
    #[error("too many failed login attempts, try again later")]
    TooManyAttempts,

    /// Unknown email or wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Correct password for a disabled account.
    #[error("user account is inactive")]
    UserInactive,

    /// A store, hashing or signing fault. Details are only logged.
    #[error("internal server error")]
    Internal,
}

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    /// Signed session token.
    pub token: String,
    /// The authenticated user, without the password hash.
    pub user: PublicUser,
}

/// Email/password authentication service.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    verifier: Arc<dyn PasswordVerifier>,
    tokens: Arc<dyn TokenIssuer>,
    limiter: AttemptLimiter,
    sessions: SessionStore,
    policy: AuthPolicy,
}

impl AuthService {
    /// Wire the service to its collaborators.
    pub fn new(
        users: Arc<dyn UserStore>,
        verifier: Arc<dyn PasswordVerifier>,
        tokens: Arc<dyn TokenIssuer>,
        cache: Arc<dyn Cache>,
        policy: AuthPolicy,
    ) -> Self {
        Self {
            users,
            verifier,
            tokens,
            limiter: AttemptLimiter::new(cache.clone(), policy.call_timeout),
            sessions: SessionStore::new(cache, policy.call_timeout),
            policy,
        }
    }

    /// The policy in force.
    pub fn policy(&self) -> &AuthPolicy {
        &self.policy
    }

    /// Authenticate `email`/`password` on behalf of `client_key`.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        client_key: &str,
    ) -> Result<LoginSuccess, LoginError> {
        let failures = self.limiter.failures(client_key).await;
        if failures >= self.policy.max_attempts {
            warn!(
                client = %client_key,
                attempts = failures,
                "Login attempt blocked: too many failures"
            );
            return Err(LoginError::TooManyAttempts);
        }

        let user = match self.lookup(email).await? {
            Some(user) => user,
            None => {
                self.limiter
                    .record_failure(client_key, self.policy.block_window)
                    .await;
                warn!(email = %email, client = %client_key, "Login failed: user not found");
                return Err(LoginError::InvalidCredentials);
            }
        };

        if !user.is_active {
            warn!(email = %email, "Login failed: account inactive");
            return Err(LoginError::UserInactive);
        }

        if !self.verify(&user, password).await? {
            self.limiter
                .record_failure(client_key, self.policy.block_window)
                .await;
            warn!(email = %email, client = %client_key, "Login failed: wrong password");
            return Err(LoginError::InvalidCredentials);
        }

        self.limiter.clear(client_key).await;

        let token = self
            .tokens
            .issue(&user.id, &user.email, &user.role)
            .map_err(|e| {
                error!(email = %email, error = %e, "Failed to sign session token");
                LoginError::Internal
            })?;

        if let Err(e) = self
            .sessions
            .store(&user.email, &token, self.policy.session_ttl)
            .await
        {
            warn!(email = %email, error = %e, "Failed to store session record");
        }

        info!(email = %email, user_id = %user.id, client = %client_key, "Login successful");

        Ok(LoginSuccess {
            token,
            user: PublicUser::from(&user),
        })
    }

    /// Drop the session record for `email`. Succeeds whether or not one
    /// existed.
    pub async fn logout(&self, email: &str) {
        match self.sessions.drop_session(email).await {
            Ok(()) => info!(email = %email, "Session closed"),
            Err(e) => warn!(email = %email, error = %e, "Failed to drop session record"),
        }
    }

    /// Whether a session record is cached for `email`. Cache faults read as
    /// no session.
    pub async fn has_session(&self, email: &str) -> bool {
        match self.sessions.current(email).await {
            Ok(token) => token.is_some(),
            Err(e) => {
                warn!(email = %email, error = %e, "Failed to read session record");
                false
            }
        }
    }

    async fn lookup(&self, email: &str) -> Result<Option<User>, LoginError> {
        match tokio::time::timeout(self.policy.call_timeout, self.users.get_by_email(email)).await {
            Ok(Ok(user)) => Ok(user),
            Ok(Err(e)) => {
                error!(email = %email, error = %e, "User lookup failed");
                Err(LoginError::Internal)
            }
            Err(_) => {
                error!(email = %email, "User lookup timed out");
                Err(LoginError::Internal)
            }
        }
    }

    /// Run the KDF off the async workers.
    async fn verify(&self, user: &User, password: &str) -> Result<bool, LoginError> {
        let verifier = Arc::clone(&self.verifier);
        let record = user.password_hash.clone();
        let candidate = password.to_string();

        let started = std::time::Instant::now();
        let verified = tokio::task::spawn_blocking(move || verifier.verify(&record, &candidate))
            .await
            .map_err(|e| {
                error!(email = %user.email, error = %e, "Password verification task failed");
                LoginError::Internal
            })?;
        debug!(
            email = %user.email,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Password verified"
        );

        Ok(verified)
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
