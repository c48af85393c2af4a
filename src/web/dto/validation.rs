//! Body extraction with field validation.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::web::error::ApiError;

/// JSON body that has passed its `validator` rules.
///
/// Handlers behind this extractor never see malformed input, so a bad
/// request can never reach the attempt limiter. Unparsable bodies and failed
/// field checks both map to `400 invalid_request`; field failures carry
/// per-field `details`.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = match Json::<T>::from_request(req, state).await {
            Ok(Json(body)) => body,
            Err(rejection) => {
                tracing::debug!(status = %rejection.status(), error = %rejection, "Unreadable request body");
                return Err(ApiError::bad_request("Request body is missing or malformed"));
            }
        };

        if let Err(errors) = body.validate() {
            let fields: Vec<String> = errors.field_errors().keys().map(|f| f.to_string()).collect();
            tracing::debug!(?fields, "Request body failed validation");
            return Err(ApiError::from_validation_errors(errors));
        }

        Ok(ValidatedJson(body))
    }
}
