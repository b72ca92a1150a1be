//! Repository layer for database operations.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::domain::{Identity, Tag};
use crate::error::{GateError, GateResult};
use crate::storage::models::{IdentityRow, TagRow};
use crate::storage::TagRecordStore;

/// Repository for identity record operations.
#[derive(Clone)]
pub struct IdentityRepository {
    pool: SqlitePool,
}

impl IdentityRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the database schema.
    pub async fn init_schema(&self) -> GateResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS identities (
                id TEXT PRIMARY KEY,
                subject TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_identities_subject ON identities(subject);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS identity_tags (
                id TEXT PRIMARY KEY,
                identity_id TEXT NOT NULL,
                name TEXT NOT NULL,
                value TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (identity_id) REFERENCES identities(id) ON DELETE CASCADE,
                UNIQUE(identity_id, name)
            );

            CREATE INDEX IF NOT EXISTS idx_identity_tags_identity ON identity_tags(identity_id);
            CREATE INDEX IF NOT EXISTS idx_identity_tags_name_value ON identity_tags(name, value);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ==================== Identities ====================

    /// Create a new identity along with its tags.
    pub async fn create_identity(&self, identity: &Identity) -> GateResult<()> {
        sqlx::query(
            r#"
            INSERT INTO identities (id, subject, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(identity.id.to_string())
        .bind(&identity.subject)
        .bind(identity.created_at.to_rfc3339())
        .bind(identity.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        for tag in &identity.tags {
            self.set_tag(identity.id, &tag.name, &tag.value).await?;
        }

        Ok(())
    }

    /// Get an identity by ID, with its tags.
    pub async fn get_identity(&self, id: Uuid) -> GateResult<Identity> {
        let row: IdentityRow = sqlx::query_as("SELECT * FROM identities WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| GateError::NotFound(format!("Identity {} not found", id)))?;

        let mut identity: Identity = row.try_into()?;
        identity.tags = self.load_tags(identity.id).await?;
        Ok(identity)
    }

    /// Get an identity by subject, with its tags.
    pub async fn get_identity_by_subject(&self, subject: &str) -> GateResult<Option<Identity>> {
        let row: Option<IdentityRow> = sqlx::query_as("SELECT * FROM identities WHERE subject = ?")
            .bind(subject)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let mut identity: Identity = row.try_into()?;
                identity.tags = self.load_tags(identity.id).await?;
                Ok(Some(identity))
            }
            None => Ok(None),
        }
    }

    // ==================== Tags ====================

    /// Set a tag on an identity, replacing any existing tag with the same
    /// name. At most one tag per (identity, name) pair exists at any time,
    /// so rotating a key is a replacement, never an accumulation.
    pub async fn set_tag(&self, identity_id: Uuid, name: &str, value: &str) -> GateResult<()> {
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO identity_tags (id, identity_id, name, value, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(identity_id, name) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(identity_id.to_string())
        .bind(name)
        .bind(value)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        sqlx::query("UPDATE identities SET updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(identity_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Remove a tag from an identity.
    pub async fn remove_tag(&self, identity_id: Uuid, name: &str) -> GateResult<()> {
        let result = sqlx::query("DELETE FROM identity_tags WHERE identity_id = ? AND name = ?")
            .bind(identity_id.to_string())
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(GateError::NotFound(format!(
                "Tag '{}' not found on identity {}",
                name, identity_id
            )));
        }

        Ok(())
    }

    /// Load all tags for an identity.
    async fn load_tags(&self, identity_id: Uuid) -> GateResult<Vec<Tag>> {
        let rows: Vec<TagRow> = sqlx::query_as(
            "SELECT name, value FROM identity_tags WHERE identity_id = ? ORDER BY name ASC",
        )
        .bind(identity_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Tag::from).collect())
    }
}

#[async_trait]
impl TagRecordStore for IdentityRepository {
    async fn find_identity_with_tag(
        &self,
        identity_id: Uuid,
        tag_name: &str,
        tag_value: &str,
    ) -> GateResult<Option<Identity>> {
        let row: Option<IdentityRow> = sqlx::query_as(
            r#"
            SELECT i.id, i.subject, i.created_at, i.updated_at
            FROM identities i
            JOIN identity_tags t ON t.identity_id = i.id
            WHERE i.id = ? AND t.name = ? AND t.value = ?
            "#,
        )
        .bind(identity_id.to_string())
        .bind(tag_name)
        .bind(tag_value)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let mut identity: Identity = row.try_into()?;
                identity.tags = self.load_tags(identity.id).await?;
                Ok(Some(identity))
            }
            None => Ok(None),
        }
    }
}
