//! Request DTOs for Web API.

use serde::Deserialize;
use validator::Validate;

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Must be at least 6 characters"))]
    pub password: String,
}
