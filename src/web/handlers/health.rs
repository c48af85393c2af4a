//! Health check handler.

use axum::Json;

use crate::web::dto::HealthResponse;

/// Service name reported by the health check.
pub const SERVICE_NAME: &str = "auth-service";

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
    })
}
