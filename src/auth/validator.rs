//! API key validation against the identity record store.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::domain::{Identity, API_KEY_TAG};
use crate::error::{GateError, GateResult};
use crate::storage::TagRecordStore;

/// Confirms a presented API key against an identity's stored record.
///
/// This is a second factor: the claimed identity must already be
/// established by an upstream stage. The validator only answers whether
/// the store holds a matching `(api-key, credential)` tag for it.
#[derive(Clone)]
pub struct ApiKeyValidator {
    store: Arc<dyn TagRecordStore>,
    lookup_timeout: Duration,
}

impl ApiKeyValidator {
    /// Create a validator backed by the given record store.
    pub fn new(store: Arc<dyn TagRecordStore>, lookup_timeout: Duration) -> Self {
        Self {
            store,
            lookup_timeout,
        }
    }

    /// Validate a credential for the claimed identity.
    ///
    /// Issues exactly one store lookup, bounded by the configured timeout.
    /// `Ok(None)` covers both "identity unknown" and "key wrong"; an empty
    /// credential is rejected without touching the store, so identities
    /// that happen to hold an empty tag value can never be matched.
    pub async fn validate(&self, credential: &str, claimed: Uuid) -> GateResult<Option<Identity>> {
        if credential.is_empty() {
            return Ok(None);
        }

        match tokio::time::timeout(
            self.lookup_timeout,
            self.store
                .find_identity_with_tag(claimed, API_KEY_TAG, credential),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(GateError::StoreTimeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Identity, Tag};
    use crate::storage::IdentityRepository;
    use async_trait::async_trait;
    use sqlx::sqlite::SqlitePool;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TIMEOUT: Duration = Duration::from_secs(2);

    async fn setup_repo() -> IdentityRepository {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        let repo = IdentityRepository::new(pool);
        repo.init_schema().await.unwrap();
        repo
    }

    /// Store double that counts lookups and returns a fixed result.
    struct CountingStore {
        calls: AtomicUsize,
        result: Option<Identity>,
    }

    #[async_trait]
    impl TagRecordStore for CountingStore {
        async fn find_identity_with_tag(
            &self,
            _identity_id: Uuid,
            _tag_name: &str,
            _tag_value: &str,
        ) -> GateResult<Option<Identity>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.result.clone())
        }
    }

    /// Store double whose lookups always fail.
    struct FailingStore;

    #[async_trait]
    impl TagRecordStore for FailingStore {
        async fn find_identity_with_tag(
            &self,
            _identity_id: Uuid,
            _tag_name: &str,
            _tag_value: &str,
        ) -> GateResult<Option<Identity>> {
            Err(GateError::Internal("store unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_matching_key_resolves_identity() {
        let repo = setup_repo().await;
        let mut identity = Identity::new("agent@example.com");
        identity.tags.push(Tag::new(API_KEY_TAG, "abc123"));
        repo.create_identity(&identity).await.unwrap();

        let validator = ApiKeyValidator::new(Arc::new(repo), TIMEOUT);
        let resolved = validator
            .validate("abc123", identity.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id, identity.id);
        assert_eq!(resolved.subject, "agent@example.com");
    }

    #[tokio::test]
    async fn test_wrong_key_and_unknown_identity_both_absent() {
        let repo = setup_repo().await;
        let mut identity = Identity::new("agent@example.com");
        identity.tags.push(Tag::new(API_KEY_TAG, "abc123"));
        repo.create_identity(&identity).await.unwrap();

        let validator = ApiKeyValidator::new(Arc::new(repo), TIMEOUT);

        assert!(validator
            .validate("wrong", identity.id)
            .await
            .unwrap()
            .is_none());
        assert!(validator
            .validate("abc123", Uuid::new_v4())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_empty_credential_never_queries_store() {
        let store = Arc::new(CountingStore {
            calls: AtomicUsize::new(0),
            result: Some(Identity::new("agent@example.com")),
        });
        let validator = ApiKeyValidator::new(store.clone(), TIMEOUT);

        let result = validator.validate("", Uuid::new_v4()).await.unwrap();
        assert!(result.is_none());
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_single_lookup_per_validation() {
        let store = Arc::new(CountingStore {
            calls: AtomicUsize::new(0),
            result: None,
        });
        let validator = ApiKeyValidator::new(store.clone(), TIMEOUT);

        validator.validate("abc123", Uuid::new_v4()).await.unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_store_failure_propagates_as_error() {
        let validator = ApiKeyValidator::new(Arc::new(FailingStore), TIMEOUT);

        let result = validator.validate("abc123", Uuid::new_v4()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_closed_pool_is_an_error_not_a_mismatch() {
        let repo = setup_repo().await;
        let mut identity = Identity::new("agent@example.com");
        identity.tags.push(Tag::new(API_KEY_TAG, "abc123"));
        repo.create_identity(&identity).await.unwrap();

        repo.pool().close().await;

        let validator = ApiKeyValidator::new(Arc::new(repo), TIMEOUT);
        let result = validator.validate("abc123", identity.id).await;
        assert!(matches!(result, Err(GateError::Database(_))));
    }
}
