//! The authentication gate: extraction + validation into allow/deny.

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName};

use crate::auth::{ApiKeyValidator, CredentialExtractor};
use crate::domain::{AuthOutcome, ClaimedIdentity, DenyReason};

/// Decision capability a protected route depends on.
///
/// One method: turn a request's headers and claimed identity into an
/// allow/deny outcome. Concrete implementations are wired explicitly at
/// router construction; there is no registry or ambient registration.
#[async_trait]
pub trait AuthenticationGate: Send + Sync {
    async fn authenticate(
        &self,
        headers: &HeaderMap,
        claimed: Option<ClaimedIdentity>,
    ) -> AuthOutcome;
}

/// Static API key gate.
///
/// Runs the extractor on the configured header, then confirms the key
/// against the claimed identity's stored record. Single pass, no retries;
/// the only suspension point is the store round trip inside the validator.
pub struct ApiKeyGate {
    header: HeaderName,
    extractor: CredentialExtractor,
    validator: ApiKeyValidator,
}

impl ApiKeyGate {
    pub fn new(
        header: HeaderName,
        extractor: CredentialExtractor,
        validator: ApiKeyValidator,
    ) -> Self {
        Self {
            header,
            extractor,
            validator,
        }
    }
}

#[async_trait]
impl AuthenticationGate for ApiKeyGate {
    async fn authenticate(
        &self,
        headers: &HeaderMap,
        claimed: Option<ClaimedIdentity>,
    ) -> AuthOutcome {
        // This gate is a second factor, not a standalone login mechanism.
        let Some(ClaimedIdentity(claimed)) = claimed else {
            return AuthOutcome::Denied(DenyReason::IdentityNotEstablished);
        };

        let header_value = headers.get(&self.header).and_then(|v| v.to_str().ok());
        let Some(credential) = self.extractor.extract(header_value) else {
            return AuthOutcome::Denied(DenyReason::MissingCredential);
        };

        match self.validator.validate(credential, claimed).await {
            Ok(Some(identity)) => AuthOutcome::Allowed(identity),
            Ok(None) => AuthOutcome::Denied(DenyReason::CredentialMismatch),
            Err(e) => {
                // Surface lookup failures to the error path. The credential
                // value itself is never logged.
                tracing::error!(
                    identity_id = %claimed,
                    header = %self.header,
                    error = %e,
                    "API key lookup failed"
                );
                AuthOutcome::Denied(DenyReason::UpstreamError)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Identity, Tag, API_KEY_TAG};
    use crate::error::{GateError, GateResult};
    use crate::storage::{IdentityRepository, TagRecordStore};
    use axum::http::header::AUTHORIZATION;
    use sqlx::sqlite::SqlitePool;
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    const TIMEOUT: Duration = Duration::from_secs(2);

    async fn setup_gate_with_identity() -> (ApiKeyGate, Identity) {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        let repo = IdentityRepository::new(pool);
        repo.init_schema().await.unwrap();

        let mut identity = Identity::new("agent@example.com");
        identity.tags.push(Tag::new(API_KEY_TAG, "abc123"));
        repo.create_identity(&identity).await.unwrap();

        let validator = ApiKeyValidator::new(Arc::new(repo), TIMEOUT);
        let gate = ApiKeyGate::new(
            AUTHORIZATION,
            CredentialExtractor::bearer(),
            validator,
        );
        (gate, identity)
    }

    fn headers_with_authorization(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[tokio::test]
    async fn test_valid_key_is_allowed() {
        let (gate, identity) = setup_gate_with_identity().await;
        let headers = headers_with_authorization("Bearer abc123");

        let outcome = gate
            .authenticate(&headers, Some(ClaimedIdentity(identity.id)))
            .await;
        assert_eq!(outcome.identity().map(|i| i.id), Some(identity.id));
    }

    #[tokio::test]
    async fn test_wrong_key_is_credential_mismatch() {
        let (gate, identity) = setup_gate_with_identity().await;
        let headers = headers_with_authorization("Bearer wrong");

        let outcome = gate
            .authenticate(&headers, Some(ClaimedIdentity(identity.id)))
            .await;
        assert_eq!(
            outcome,
            AuthOutcome::Denied(DenyReason::CredentialMismatch)
        );
    }

    #[tokio::test]
    async fn test_missing_header_is_missing_credential() {
        let (gate, identity) = setup_gate_with_identity().await;

        let outcome = gate
            .authenticate(&HeaderMap::new(), Some(ClaimedIdentity(identity.id)))
            .await;
        assert_eq!(outcome, AuthOutcome::Denied(DenyReason::MissingCredential));
    }

    #[tokio::test]
    async fn test_wrong_scheme_is_missing_credential() {
        let (gate, identity) = setup_gate_with_identity().await;
        // Remainder would match a valid key, but the prefix fails closed
        let headers = headers_with_authorization("Token abc123");

        let outcome = gate
            .authenticate(&headers, Some(ClaimedIdentity(identity.id)))
            .await;
        assert_eq!(outcome, AuthOutcome::Denied(DenyReason::MissingCredential));
    }

    #[tokio::test]
    async fn test_no_claimed_identity_is_denied() {
        let (gate, _) = setup_gate_with_identity().await;
        let headers = headers_with_authorization("Bearer abc123");

        let outcome = gate.authenticate(&headers, None).await;
        assert_eq!(
            outcome,
            AuthOutcome::Denied(DenyReason::IdentityNotEstablished)
        );
    }

    #[tokio::test]
    async fn test_empty_credential_is_credential_mismatch() {
        let (gate, identity) = setup_gate_with_identity().await;
        let headers = headers_with_authorization("Bearer ");

        let outcome = gate
            .authenticate(&headers, Some(ClaimedIdentity(identity.id)))
            .await;
        assert_eq!(
            outcome,
            AuthOutcome::Denied(DenyReason::CredentialMismatch)
        );
    }

    #[tokio::test]
    async fn test_unknown_identity_indistinguishable_from_wrong_key() {
        let (gate, identity) = setup_gate_with_identity().await;

        let wrong_key = gate
            .authenticate(
                &headers_with_authorization("Bearer wrong"),
                Some(ClaimedIdentity(identity.id)),
            )
            .await;
        let unknown_identity = gate
            .authenticate(
                &headers_with_authorization("Bearer abc123"),
                Some(ClaimedIdentity(Uuid::new_v4())),
            )
            .await;
        assert_eq!(wrong_key, unknown_identity);
    }

    #[tokio::test]
    async fn test_store_failure_is_upstream_error() {
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

        let validator = ApiKeyValidator::new(Arc::new(FailingStore), TIMEOUT);
        let gate = ApiKeyGate::new(
            AUTHORIZATION,
            CredentialExtractor::bearer(),
            validator,
        );

        let outcome = gate
            .authenticate(
                &headers_with_authorization("Bearer abc123"),
                Some(ClaimedIdentity(Uuid::new_v4())),
            )
            .await;
        assert_eq!(outcome, AuthOutcome::Denied(DenyReason::UpstreamError));
    }

    #[tokio::test]
    async fn test_authenticate_is_idempotent() {
        let (gate, identity) = setup_gate_with_identity().await;
        let headers = headers_with_authorization("Bearer abc123");
        let claimed = Some(ClaimedIdentity(identity.id));

        let first = gate.authenticate(&headers, claimed).await;
        let second = gate.authenticate(&headers, claimed).await;
        assert_eq!(first, second);
        assert!(first.is_allowed());
    }
}
