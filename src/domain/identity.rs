//! Identity domain types.
//!
//! An identity is an opaque, stable reference to a principal plus an
//! unordered set of (name, value) tags. The valid API key for an identity
//! is stored as a tag under the name `api-key`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Tag name under which an identity's API key is stored.
pub const API_KEY_TAG: &str = "api-key";

/// A (name, value) pair attached to an identity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A principal known to the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    /// Unique identifier (the identity reference carried by requests).
    pub id: Uuid,
    /// Stable principal label (e.g. an email or service name).
    pub subject: String,
    /// Credential/metadata tags. The store enforces at most one tag per
    /// name, so an identity holds at most one live API key.
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// When the identity was created.
    pub created_at: DateTime<Utc>,
    /// When the identity was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Create a new identity with no tags.
    pub fn new(subject: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            subject: subject.into(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Look up a tag value by name.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.value.as_str())
    }
}

/// Identity reference established by an upstream authentication stage.
///
/// Inserted into request extensions by the session middleware before the
/// API key gate runs; the gate confirms the second factor against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimedIdentity(pub Uuid);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_lookup() {
        let mut identity = Identity::new("agent@example.com");
        identity.tags.push(Tag::new(API_KEY_TAG, "abc123"));
        identity.tags.push(Tag::new("team", "payments"));

        assert_eq!(identity.tag(API_KEY_TAG), Some("abc123"));
        assert_eq!(identity.tag("team"), Some("payments"));
        assert_eq!(identity.tag("missing"), None);
    }
}
