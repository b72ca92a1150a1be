//! Database models for Keygate.
//!
//! These are the row types returned by SQLx queries.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{Identity, Tag};
use crate::error::GateError;

/// Database row for the identities table.
#[derive(Debug, Clone, FromRow)]
pub struct IdentityRow {
    pub id: String,
    pub subject: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<IdentityRow> for Identity {
    type Error = GateError;

    fn try_from(row: IdentityRow) -> Result<Self, Self::Error> {
        Ok(Identity {
            id: Uuid::parse_str(&row.id).map_err(|e| GateError::Internal(e.to_string()))?,
            subject: row.subject,
            // Tags are loaded separately by the repository.
            tags: Vec::new(),
            created_at: DateTime::parse_from_rfc3339(&row.created_at)
                .map_err(|e| GateError::Internal(e.to_string()))?
                .with_timezone(&Utc),
            updated_at: DateTime::parse_from_rfc3339(&row.updated_at)
                .map_err(|e| GateError::Internal(e.to_string()))?
                .with_timezone(&Utc),
        })
    }
}

/// Database row for the identity_tags table.
#[derive(Debug, Clone, FromRow)]
pub struct TagRow {
    pub name: String,
    pub value: String,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            name: row.name,
            value: row.value,
        }
    }
}
