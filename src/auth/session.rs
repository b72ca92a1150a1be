//! Session tokens: the upstream factor that establishes the claimed identity.
//!
//! The API key gate only confirms a second factor; something must claim an
//! identity first. This module issues and validates short-lived JWTs whose
//! subject is the identity id.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ClaimedIdentity;
use crate::error::{GateError, GateResult};

/// JWT claims for a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the claimed identity id.
    pub sub: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at time (Unix timestamp).
    pub iat: i64,
    /// Issuer.
    pub iss: String,
}

/// Session token manager.
#[derive(Clone)]
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    /// Token validity duration in hours.
    token_duration_hours: i64,
}

impl SessionManager {
    /// Create a new session manager with the given secret.
    pub fn new(secret: &str, issuer: String, token_duration_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            token_duration_hours,
        }
    }

    /// Issue a session token claiming the given identity.
    pub fn issue_token(&self, identity_id: Uuid) -> GateResult<String> {
        let now = Utc::now();
        let exp = now + Duration::hours(self.token_duration_hours);

        let claims = SessionClaims {
            sub: identity_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| GateError::Internal(format!("Failed to issue token: {}", e)))
    }

    /// Validate a session token and return the identity it claims.
    pub fn validate_token(&self, token: &str) -> GateResult<ClaimedIdentity> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        let token_data: TokenData<SessionClaims> = decode(token, &self.decoding_key, &validation)
            .map_err(|e| {
            tracing::debug!(error = %e, "Session token validation failed");
            GateError::Unauthorized("Invalid or expired session token".to_string())
        })?;

        let identity_id = Uuid::parse_str(&token_data.claims.sub)
            .map_err(|_| GateError::Unauthorized("Malformed session subject".to_string()))?;

        Ok(ClaimedIdentity(identity_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SessionManager {
        SessionManager::new("test-secret-key-12345", "keygate".to_string(), 24)
    }

    #[test]
    fn test_session_roundtrip() {
        let manager = manager();
        let identity_id = Uuid::new_v4();

        let token = manager.issue_token(identity_id).unwrap();
        let claimed = manager.validate_token(&token).unwrap();
        assert_eq!(claimed, ClaimedIdentity(identity_id));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let manager = manager();
        assert!(manager.validate_token("not-a-jwt").is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let manager = manager();
        let other = SessionManager::new("different-secret", "keygate".to_string(), 24);

        let token = other.issue_token(Uuid::new_v4()).unwrap();
        assert!(manager.validate_token(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let manager = manager();
        let other = SessionManager::new("test-secret-key-12345", "someone-else".to_string(), 24);

        let token = other.issue_token(Uuid::new_v4()).unwrap();
        assert!(manager.validate_token(&token).is_err());
    }
}
