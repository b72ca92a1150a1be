//! Authentication outcome types.

use serde::{Deserialize, Serialize};

use crate::domain::Identity;

/// Result of running the authentication gate for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Credential verified; carries the resolved identity.
    Allowed(Identity),
    /// Credential rejected; the request must not reach protected logic.
    Denied(DenyReason),
}

impl AuthOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AuthOutcome::Allowed(_))
    }

    /// The resolved identity, if the outcome is an allow.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthOutcome::Allowed(identity) => Some(identity),
            AuthOutcome::Denied(_) => None,
        }
    }
}

/// Why a request was denied.
///
/// All reasons terminate as an authorization failure for the caller;
/// only `UpstreamError` is additionally reported to the error path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// Header absent or scheme prefix malformed.
    MissingCredential,
    /// No claimed identity on the request; the upstream factor never ran.
    IdentityNotEstablished,
    /// Store returned no record matching the (identity, key) pair.
    CredentialMismatch,
    /// The store lookup itself failed (timeout, transport failure).
    UpstreamError,
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenyReason::MissingCredential => write!(f, "missing_credential"),
            DenyReason::IdentityNotEstablished => write!(f, "identity_not_established"),
            DenyReason::CredentialMismatch => write!(f, "credential_mismatch"),
            DenyReason::UpstreamError => write!(f, "upstream_error"),
        }
    }
}
