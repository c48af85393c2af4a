//! Route table and middleware stack.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{health, login, logout, me, AppState};
use super::middleware::{create_cors_layer, security_headers};

/// Routes reachable without a token.
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/health", get(health))
}

/// Routes whose handlers extract `AuthUser` from the bearer token.
fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
}

/// Build the service router.
///
/// The token manager is also installed as an extension so the `AuthUser`
/// extractor works without knowing the state type.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let tokens = Arc::clone(&app_state.tokens);

    let stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(create_cors_layer(cors_origins))
        .layer(middleware::from_fn(security_headers))
        .layer(Extension(tokens));

    public_routes()
        .merge(session_routes())
        .layer(stack)
        .with_state(app_state)
}
