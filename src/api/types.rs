//! API request and response types.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::Identity;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// The identity resolved for an authenticated request.
///
/// Tag values are never echoed back; only the tag names are listed.
#[derive(Debug, Serialize, ToSchema)]
pub struct WhoamiResponse {
    /// Identity reference.
    pub id: Uuid,
    /// Principal label.
    pub subject: String,
    /// Names of the tags attached to the identity.
    pub tag_names: Vec<String>,
}

impl From<Identity> for WhoamiResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            subject: identity.subject,
            tag_names: identity.tags.into_iter().map(|t| t.name).collect(),
        }
    }
}
