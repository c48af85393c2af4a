//! Bearer token authentication.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

use crate::auth::{Claims, TokenError, TokenManager};
use crate::web::error::ApiError;

/// Extractor for authenticated callers.
///
/// Reads `Authorization: Bearer <token>` and validates it with the
/// [`TokenManager`] installed as a request extension by the router.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Missing authorization"))?;

        let tokens = parts
            .extensions
            .get::<Arc<TokenManager>>()
            .ok_or_else(|| ApiError::internal("Token validation is not configured"))?;

        let claims = tokens.validate(token).map_err(|e| match e {
            TokenError::Expired => ApiError::unauthorized("Token has expired"),
            _ => ApiError::unauthorized("Invalid token"),
        })?;

        Ok(AuthUser(claims))
    }
}
