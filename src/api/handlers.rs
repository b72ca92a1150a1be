//! HTTP request handlers.

use axum::{Extension, Json};

use crate::api::types::{HealthResponse, WhoamiResponse};
use crate::domain::Identity;

/// Health check endpoint.
///
/// GET /v1/health
#[utoipa::path(
    get,
    path = "/v1/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Return the identity resolved by the authentication gate.
///
/// GET /v1/whoami
#[utoipa::path(
    get,
    path = "/v1/whoami",
    responses(
        (status = 200, description = "Resolved identity", body = WhoamiResponse),
        (status = 401, description = "Authentication failed")
    ),
    security(
        ("session_token" = []),
        ("api_key" = [])
    ),
    tag = "auth"
)]
pub async fn whoami(Extension(identity): Extension<Identity>) -> Json<WhoamiResponse> {
    Json(WhoamiResponse::from(identity))
}
