//! SQL user store tests against an in-memory SQLite database.

#![cfg(not(feature = "postgres"))]

mod common;

use std::sync::Arc;

use auth_service::auth::PasswordVerifier;
use auth_service::{
    AuthPolicy, AuthService, Database, LoginError, MemoryCache, NewUser, SqlUserStore,
    TokenConfig, TokenManager, UserStore,
};

use common::cheap_hasher;

async fn store() -> SqlUserStore {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    SqlUserStore::new(db.pool().clone())
}

#[tokio::test]
async fn test_stored_record_verifies() {
    let store = store().await;
    let hasher = cheap_hasher();

    store
        .create(&NewUser::new("a@x.com", hasher.hash("secret1").unwrap()))
        .await
        .unwrap();

    let user = store.get_by_email("a@x.com").await.unwrap().unwrap();
    assert!(user.password_hash.starts_with("$argon2id$v=19$m=256,t=1,p=1$"));
    assert!(hasher.verify(&user.password_hash, "secret1"));
    assert!(!hasher.verify(&user.password_hash, "secret2"));
}

#[tokio::test]
async fn test_email_lookup_is_exact() {
    let store = store().await;
    store.create(&NewUser::new("a@x.com", "h")).await.unwrap();

    assert!(store.get_by_email("b@x.com").await.unwrap().is_none());
    assert!(store.get_by_email("").await.unwrap().is_none());
}

#[tokio::test]
async fn test_login_against_sql_store() {
    let store = Arc::new(store().await);
    let hasher = cheap_hasher();
    store
        .create(&NewUser::new("a@x.com", hasher.hash("secret1").unwrap()).with_role("admin"))
        .await
        .unwrap();
    store
        .create(&NewUser::new("off@x.com", hasher.hash("secret1").unwrap()).active(false))
        .await
        .unwrap();

    let tokens = Arc::new(TokenManager::new(&TokenConfig::new(common::JWT_SECRET)));
    let service = AuthService::new(
        store.clone(),
        Arc::new(hasher),
        tokens.clone(),
        Arc::new(MemoryCache::new()),
        AuthPolicy::default(),
    );

    let success = service
        .authenticate("a@x.com", "secret1", "10.0.0.1")
        .await
        .unwrap();
    assert_eq!(success.user.role, "admin");
    assert_eq!(tokens.validate(&success.token).unwrap().sub, success.user.id);

    assert_eq!(
        service
            .authenticate("off@x.com", "secret1", "10.0.0.1")
            .await
            .unwrap_err(),
        LoginError::UserInactive
    );
}
