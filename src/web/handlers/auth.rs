//! Authentication handlers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    Json,
};

use crate::auth::{AuthService, TokenManager};
use crate::web::dto::{LoginRequest, LoginResponse, MeResponse, MessageResponse, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::middleware::{client_key, AuthUser};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Login service.
    pub auth: Arc<AuthService>,
    /// Token validation for bearer-authenticated routes.
    pub tokens: Arc<TokenManager>,
    /// Take the client key from proxy headers.
    pub trust_proxy_headers: bool,
}

impl AppState {
    /// Create a new application state.
    pub fn new(auth: Arc<AuthService>, tokens: Arc<TokenManager>) -> Self {
        Self {
            auth,
            tokens,
            trust_proxy_headers: false,
        }
    }

    /// Set whether proxy headers are trusted.
    pub fn with_trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }
}

/// POST /login - Authenticate and receive a session token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    let client = client_key(&headers, peer, state.trust_proxy_headers);

    let success = state
        .auth
        .authenticate(&req.email, &req.password, &client)
        .await?;

    Ok(Json(LoginResponse::from(success)))
}

/// POST /logout - Drop the caller's cached session record.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Json<MessageResponse> {
    state.auth.logout(&claims.email).await;
    Json(MessageResponse::new("Session closed"))
}

/// GET /me - Identity behind the presented token.
pub async fn me(State(state): State<Arc<AppState>>, AuthUser(claims): AuthUser) -> Json<MeResponse> {
    let session_active = state.auth.has_session(&claims.email).await;
    Json(MeResponse::new(claims, session_active))
}
