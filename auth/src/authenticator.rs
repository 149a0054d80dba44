//! Token authenticator: signature check, revocation check, claim decoding.

use std::sync::Arc;

use venue_booking_core::environment::{Clock, SystemClock};
use venue_booking_core::types::Identity;

use crate::config::TokenConfig;
use crate::error::{AuthError, Result};
use crate::revocation::RevocationList;
use crate::token::{Claims, TokenCodec};

/// Scheme prefix accepted in front of a credential.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Strip an optional `Bearer ` prefix and surrounding whitespace.
#[must_use]
pub fn strip_bearer(credential: &str) -> &str {
    let credential = credential.trim();
    credential.strip_prefix(BEARER_PREFIX).unwrap_or(credential).trim()
}

/// Verifies credentials against the signing secret and the revocation list.
///
/// Stateless apart from the revocation list: any instance sharing the
/// secret and the list accepts the same credentials.
pub struct TokenAuthenticator<R> {
    codec: TokenCodec,
    revocations: R,
    clock: Arc<dyn Clock>,
}

impl<R: Clone> Clone for TokenAuthenticator<R> {
    fn clone(&self) -> Self {
        Self {
            codec: self.codec.clone(),
            revocations: self.revocations.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R: std::fmt::Debug> std::fmt::Debug for TokenAuthenticator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthenticator")
            .field("codec", &self.codec)
            .field("revocations", &self.revocations)
            .finish_non_exhaustive()
    }
}

impl<R: RevocationList> TokenAuthenticator<R> {
    /// Create an authenticator using the system clock.
    #[must_use]
    pub fn new(config: &TokenConfig, revocations: R) -> Self {
        Self::with_clock(config, revocations, Arc::new(SystemClock))
    }

    /// Create an authenticator with an injected clock.
    #[must_use]
    pub fn with_clock(config: &TokenConfig, revocations: R, clock: Arc<dyn Clock>) -> Self {
        Self {
            codec: TokenCodec::new(config),
            revocations,
            clock,
        }
    }

    /// The revocation list in use.
    #[must_use]
    pub const fn revocations(&self) -> &R {
        &self.revocations
    }

    /// Sign a credential for `identity`, valid for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Crypto`] if signing fails.
    pub fn issue(&self, identity: &Identity) -> Result<String> {
        self.codec.issue(identity, self.clock.now())
    }

    /// Verify a credential and produce the identity it carries.
    ///
    /// Order: signature and structure, then the revocation list, then the
    /// claims (including expiry against the clock).
    ///
    /// # Errors
    ///
    /// - Bad signature or structure → [`AuthError::TokenInvalid`]
    /// - On the revocation list → [`AuthError::TokenRevoked`]
    /// - Missing or mistyped claim → [`AuthError::MalformedClaims`]
    /// - Past expiry → [`AuthError::TokenExpired`]
    pub async fn authenticate(&self, credential: &str) -> Result<Identity> {
        let token = strip_bearer(credential);
        let payload = self.codec.verify(token)?;

        if self.revocations.is_revoked(token).await? {
            tracing::debug!("Rejected revoked credential");
            return Err(AuthError::TokenRevoked);
        }

        let claims = Claims::from_payload(payload)?;
        if claims.is_expired_at(self.clock.now()) {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims.identity())
    }

    /// Add a credential to the revocation list.
    ///
    /// The credential is not verified first; revoking garbage is harmless.
    ///
    /// # Errors
    ///
    /// Returns error if the revocation list rejects or fails to store it.
    pub async fn revoke(&self, credential: &str) -> Result<()> {
        self.revocations.revoke(strip_bearer(credential)).await?;
        metrics::counter!("booking_revocations_total").increment(1);
        tracing::info!("Credential revoked");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::revocation::InMemoryRevocationList;
    use chrono::Duration;
    use venue_booking_core::types::Role;
    use venue_booking_testing::{FixedClock, test_clock};

    fn authenticator_at(clock: FixedClock) -> TokenAuthenticator<InMemoryRevocationList> {
        TokenAuthenticator::with_clock(
            &TokenConfig::new("test-secret"),
            InMemoryRevocationList::new(),
            Arc::new(clock),
        )
    }

    #[tokio::test]
    async fn test_issued_credential_authenticates_with_or_without_prefix() {
        let auth = authenticator_at(test_clock());
        let identity = Identity::new("alice", Role::Audience);
        let token = auth.issue(&identity).unwrap();

        assert_eq!(auth.authenticate(&token).await.unwrap(), identity);
        assert_eq!(
            auth.authenticate(&format!("Bearer {token}")).await.unwrap(),
            identity
        );
    }

    #[tokio::test]
    async fn test_expired_credential_is_rejected() {
        let issued_at = test_clock().now();
        let token = authenticator_at(FixedClock::new(issued_at))
            .issue(&Identity::new("alice", Role::Audience))
            .unwrap();

        let later = authenticator_at(FixedClock::new(issued_at + Duration::hours(2)));
        assert_eq!(later.authenticate(&token).await, Err(AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn test_revocation_is_idempotent() {
        let auth = authenticator_at(test_clock());
        let token = auth.issue(&Identity::new("alice", Role::Artist)).unwrap();

        auth.revoke(&token).await.unwrap();
        assert_eq!(auth.authenticate(&token).await, Err(AuthError::TokenRevoked));

        auth.revoke(&format!("Bearer {token}")).await.unwrap();
        assert_eq!(auth.authenticate(&token).await, Err(AuthError::TokenRevoked));
        assert_eq!(auth.revocations().len().await, 1);
    }

    #[tokio::test]
    async fn test_garbage_credential_is_invalid() {
        let auth = authenticator_at(test_clock());
        assert!(matches!(
            auth.authenticate("garbage").await,
            Err(AuthError::TokenInvalid(_))
        ));
    }

    #[tokio::test]
    async fn test_signed_credential_without_role_is_malformed() {
        let auth = authenticator_at(test_clock());
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &serde_json::json!({ "username": "alice", "iat": 0, "exp": i64::MAX }),
            &jsonwebtoken::EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(
            auth.authenticate(&token).await,
            Err(AuthError::MalformedClaims(_))
        ));
    }
}
