//! Storage layer for identity records.
//!
//! The gate consumes the record store through the `TagRecordStore` trait;
//! `IdentityRepository` is the SQLite-backed implementation used by the
//! service binary.

mod models;
mod repository;

pub use models::*;
pub use repository::*;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Identity;
use crate::error::GateResult;

/// Query contract the validator consumes from the record store.
///
/// Absence is a normal, non-exceptional result; `Err` means the lookup
/// itself failed (transport or storage fault).
#[async_trait]
pub trait TagRecordStore: Send + Sync {
    /// Find the identity matching `identity_id` that carries a tag with
    /// the given name and exact value.
    ///
    /// "Identity unknown" and "identity known but tag absent/different"
    /// both return `Ok(None)`; callers cannot distinguish them.
    async fn find_identity_with_tag(
        &self,
        identity_id: Uuid,
        tag_name: &str,
        tag_value: &str,
    ) -> GateResult<Option<Identity>>;
}
