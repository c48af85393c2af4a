//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::HeaderName;
use axum_test::TestServer;

use auth_service::web::create_router;
use auth_service::{
    Argon2Hasher, AppState, AuthPolicy, AuthService, HashParams, MemoryCache, MemoryUserStore,
    NewUser, TokenConfig, TokenManager,
};

pub const JWT_SECRET: &str = "test-secret-key-for-testing-only";

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Argon2 parameters cheap enough for tests.
pub fn cheap_params() -> HashParams {
    HashParams {
        memory_kib: 256,
        iterations: 1,
        parallelism: 1,
        ..HashParams::default()
    }
}

pub fn cheap_hasher() -> Argon2Hasher {
    Argon2Hasher::new(cheap_params()).expect("valid test params")
}

/// A running router over in-memory collaborators.
pub struct TestApp {
    pub server: TestServer,
    pub users: Arc<MemoryUserStore>,
    pub cache: Arc<MemoryCache>,
    pub tokens: Arc<TokenManager>,
    pub hasher: Argon2Hasher,
}

impl TestApp {
    /// Build the app. Proxy headers are trusted so tests can pick client keys.
    pub fn new() -> Self {
        Self::with_policy(AuthPolicy::default())
    }

    pub fn with_policy(policy: AuthPolicy) -> Self {
        let hasher = cheap_hasher();
        let users = Arc::new(MemoryUserStore::new());
        let cache = Arc::new(MemoryCache::new());
        let tokens = Arc::new(TokenManager::new(&TokenConfig::new(JWT_SECRET)));

        let auth = AuthService::new(
            users.clone(),
            Arc::new(hasher.clone()),
            tokens.clone(),
            cache.clone(),
            policy,
        );
        let state = AppState::new(Arc::new(auth), tokens.clone()).with_trust_proxy_headers(true);
        let server =
            TestServer::new(create_router(Arc::new(state), &[])).expect("Failed to create test server");

        Self {
            server,
            users,
            cache,
            tokens,
            hasher,
        }
    }

    /// Store a user with the given password.
    pub fn add_user(&self, email: &str, password: &str, active: bool) {
        let record = self.hasher.hash(password).expect("hash");
        self.users
            .insert(NewUser::new(email, record).active(active))
            .expect("insert user");
    }
}
