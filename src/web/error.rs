//! JSON error responses.
//!
//! Every failure leaves the API as `{"error": <code>, "message": <text>}`,
//! plus a `details` map of field messages when a request body fails validation.

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::LoginError;

/// Field name to the messages of every rule it broke.
pub type FieldErrors = HashMap<String, Vec<String>>;

/// Machine-readable error codes, serialized in snake_case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed body or failed field validation.
    InvalidRequest,
    /// Missing or rejected bearer token.
    Unauthorized,
    /// Unknown email or wrong password. Both look the same to the client.
    InvalidCredentials,
    UserInactive,
    /// Client blocked after repeated failures.
    TooManyRequests,
    InternalError,
}

impl ErrorCode {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::UserInactive => StatusCode::FORBIDDEN,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Wire shape of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<FieldErrors>,
}

/// An error a handler returns to the client.
#[derive(Debug, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    details: Option<FieldErrors>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attach per-field messages.
    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: FieldErrors) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Collect `validator` failures into a `400 invalid_request`.
    ///
    /// Rules declared without a message fall back to the rule's code.
    pub fn from_validation_errors(errors: validator::ValidationErrors) -> Self {
        let details: FieldErrors = errors
            .field_errors()
            .into_iter()
            .map(|(field, failures)| {
                let messages = failures
                    .iter()
                    .map(|failure| match &failure.message {
                        Some(message) => message.to_string(),
                        None => format!("{field}: {}", failure.code),
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();

        Self::with_details(ErrorCode::InvalidRequest, "Validation failed", details)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        if status.is_server_error() {
            tracing::error!(code = ?self.code, message = %self.message, "Request failed");
        }

        let body = ErrorBody {
            error: self.code,
            message: self.message,
            details: self.details,
        };
        (status, Json(body)).into_response()
    }
}

impl From<LoginError> for ApiError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::TooManyAttempts => ApiError::new(
                ErrorCode::TooManyRequests,
                "Too many failed attempts. Try again in 15 minutes.",
            ),
            LoginError::InvalidCredentials => {
                ApiError::new(ErrorCode::InvalidCredentials, "Invalid email or password.")
            }
            LoginError::UserInactive => ApiError::new(
                ErrorCode::UserInactive,
                "Your account is disabled. Contact the administrator.",
            ),
            LoginError::Internal => ApiError::internal("Internal server error."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn render(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_login_outcomes_render() {
        let cases = [
            (LoginError::TooManyAttempts, 429, "too_many_requests"),
            (LoginError::InvalidCredentials, 401, "invalid_credentials"),
            (LoginError::UserInactive, 403, "user_inactive"),
            (LoginError::Internal, 500, "internal_error"),
        ];

        for (err, status, code) in cases {
            let (got_status, body) = render(err.into()).await;
            assert_eq!(got_status.as_u16(), status, "{err:?}");
            assert_eq!(body["error"], code);
            assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
            assert!(body.get("details").is_none());
        }
    }

    #[tokio::test]
    async fn test_token_rejection_renders_unauthorized() {
        let (status, body) = render(ApiError::unauthorized("Missing bearer token")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
        assert_eq!(body["message"], "Missing bearer token");
    }

    #[test]
    fn test_validation_messages_collected() {
        let mut errors = validator::ValidationErrors::new();
        errors.add(
            "email",
            validator::ValidationError::new("email").with_message("Must be an email".into()),
        );
        errors.add("password", validator::ValidationError::new("length"));

        let err = ApiError::from_validation_errors(errors);
        assert_eq!(err.code(), ErrorCode::InvalidRequest);

        let details = err.details.unwrap();
        assert_eq!(details["email"], vec!["Must be an email".to_string()]);
        assert_eq!(details["password"], vec!["password: length".to_string()]);
    }

    #[test]
    fn test_display() {
        let err = ApiError::bad_request("Request body is missing or malformed");
        assert_eq!(
            err.to_string(),
            "InvalidRequest: Request body is missing or malformed"
        );
    }
}
