//! HTTP handlers for promotion-service.

pub mod payments;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "promotion-service" })),
    )
}

/// Fallback for unknown paths and methods. Speaks the same envelope as
/// every error.
pub async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "status": false, "message": "Route not found" })),
    )
}
