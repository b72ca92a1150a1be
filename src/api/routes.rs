//! Route definitions for the API.
//!
//! The gate is wired per route group, explicitly, at construction time.
//! Nothing registers itself process-wide.

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers;
use crate::auth::{
    require_api_key, require_session, AuthenticationGate, SessionManager, SESSION_TOKEN_HEADER,
};

/// Security scheme modifier for OpenAPI.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_token",
                SecurityScheme::ApiKey(utoipa::openapi::security::ApiKey::Header(
                    utoipa::openapi::security::ApiKeyValue::new(SESSION_TOKEN_HEADER),
                )),
            );
            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(
                    HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::health_check, handlers::whoami),
    components(schemas(
        crate::api::types::HealthResponse,
        crate::api::types::WhoamiResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authenticated identity endpoints"),
        (name = "health", description = "Health and status endpoints")
    ),
    info(
        title = "Keygate API",
        version = "0.1.0",
        description = "API key authentication gate - verifies a per-identity static key as a second factor",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Build the API router.
///
/// Protected routes carry two layers: the session stage establishes the
/// claimed identity, then the API key gate confirms the second factor.
pub fn build_router(gate: Arc<dyn AuthenticationGate>, sessions: SessionManager) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected_routes = Router::new()
        .route("/v1/whoami", get(handlers::whoami))
        .layer(middleware::from_fn_with_state(gate, require_api_key))
        .layer(middleware::from_fn_with_state(sessions, require_session));

    let public_routes = Router::new().route("/v1/health", get(handlers::health_check));

    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
