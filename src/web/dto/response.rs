//! Response DTOs for Web API.

use serde::Serialize;

use crate::auth::{Claims, LoginSuccess};
use crate::db::PublicUser;

/// Successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

impl From<LoginSuccess> for LoginResponse {
    fn from(success: LoginSuccess) -> Self {
        Self {
            token: success.token,
            user: success.user,
        }
    }
}

/// Plain acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Identity behind the presented token.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// User ID (token subject).
    pub id: String,
    pub email: String,
    pub role: String,
    /// Token issue time (Unix seconds).
    pub issued_at: i64,
    /// Token expiry (Unix seconds).
    pub expires_at: i64,
    /// Whether a cached session record exists for this email.
    pub session_active: bool,
}

impl MeResponse {
    pub fn new(claims: Claims, session_active: bool) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
            issued_at: claims.iat,
            expires_at: claims.exp,
            session_active,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}
