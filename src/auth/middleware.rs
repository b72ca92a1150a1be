//! Authentication middleware for axum.
//!
//! Two layers, applied per route group at router construction:
//! - `require_session`: upstream factor, establishes the claimed identity
//! - `require_api_key`: this gate, confirms the key and attaches the
//!   resolved identity to the request extensions

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::{AuthenticationGate, SessionManager};
use crate::domain::{AuthOutcome, ClaimedIdentity, DenyReason, Identity};

/// Header carrying the upstream session token.
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// Error response for authentication failures.
#[derive(Debug, Serialize)]
pub struct AuthError {
    pub error: String,
    pub code: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self)).into_response()
    }
}

impl AuthError {
    /// Map a deny reason to the client-facing failure body.
    ///
    /// A mismatch and an upstream failure deliberately share the same
    /// code, so neither store health nor identity existence leaks to an
    /// unauthenticated caller.
    fn from_reason(reason: DenyReason) -> Self {
        match reason {
            DenyReason::MissingCredential => AuthError {
                error: "Missing API key".to_string(),
                code: "MISSING_API_KEY".to_string(),
            },
            DenyReason::IdentityNotEstablished => AuthError {
                error: "Authentication required".to_string(),
                code: "UNAUTHENTICATED".to_string(),
            },
            DenyReason::CredentialMismatch | DenyReason::UpstreamError => AuthError {
                error: "Invalid API key".to_string(),
                code: "INVALID_API_KEY".to_string(),
            },
        }
    }
}

/// Establish the claimed identity from the session token header.
///
/// Inserts `ClaimedIdentity` into request extensions for the gate to
/// confirm. Missing or invalid token → 401.
pub async fn require_session(
    State(sessions): State<SessionManager>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = request
        .headers()
        .get(SESSION_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AuthError {
            error: "Missing session token".to_string(),
            code: "UNAUTHENTICATED".to_string(),
        })?;

    let claimed = sessions.validate_token(token).map_err(|e| {
        tracing::debug!(error = %e, "Session validation failed");
        AuthError {
            error: "Invalid or expired session".to_string(),
            code: "INVALID_SESSION".to_string(),
        }
    })?;

    request.extensions_mut().insert(claimed);

    Ok(next.run(request).await)
}

/// Run the API key gate for this request.
///
/// On allow, attaches the resolved `Identity` to request extensions and
/// continues. On any denial the extensions are left untouched and the
/// request never reaches protected logic.
pub async fn require_api_key(
    State(gate): State<Arc<dyn AuthenticationGate>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let claimed = request.extensions().get::<ClaimedIdentity>().copied();

    match gate.authenticate(request.headers(), claimed).await {
        AuthOutcome::Allowed(identity) => {
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        AuthOutcome::Denied(reason) => Err(AuthError::from_reason(reason)),
    }
}

/// Extension trait to extract auth info from request extensions.
pub trait AuthExtensions {
    /// The identity resolved by the gate, if the request was allowed.
    fn identity(&self) -> Option<&Identity>;
    /// The identity reference claimed by the upstream factor.
    fn claimed_identity(&self) -> Option<ClaimedIdentity>;
}

impl<B> AuthExtensions for Request<B> {
    fn identity(&self) -> Option<&Identity> {
        self.extensions().get()
    }

    fn claimed_identity(&self) -> Option<ClaimedIdentity> {
        self.extensions().get().copied()
    }
}
