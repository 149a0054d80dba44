//! HS256 signed-claims tokens.
//!
//! Verification is split in two so the authenticator can consult the
//! revocation list between the signature check and claim decoding:
//! [`TokenCodec::verify`] checks signature and structure only, and
//! [`Claims::from_payload`] decodes the verified payload.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use venue_booking_core::types::{Identity, Role};

use crate::config::TokenConfig;
use crate::error::{AuthError, Result};

/// Claims embedded in every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Unique username of the holder.
    pub username: String,
    /// Role of the holder.
    pub role: Role,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// Claims for `identity`, valid from `now` for `ttl`.
    #[must_use]
    pub fn new(identity: &Identity, now: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        Self {
            username: identity.username.clone(),
            role: identity.role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// Decode a verified payload.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedClaims`] if a claim is absent, has the
    /// wrong type, or names an unknown role.
    pub fn from_payload(payload: serde_json::Value) -> Result<Self> {
        serde_json::from_value(payload).map_err(|e| AuthError::MalformedClaims(e.to_string()))
    }

    /// Whether the token has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Identity carried by these claims.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(self.username.clone(), self.role)
    }
}

/// Signs and verifies tokens with a shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Create a codec from configuration.
    #[must_use]
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock after claim decoding.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            ttl: config.ttl,
        }
    }

    /// Configured time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Sign a token for `identity`, issued at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Crypto`] if encoding fails.
    pub fn issue(&self, identity: &Identity, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims::new(identity, now, self.ttl);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
    }

    /// Check signature, algorithm and structure, returning the raw payload.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenInvalid`] if the token is not a well-formed
    /// HS256 token signed with this codec's secret.
    pub fn verify(&self, token: &str) -> Result<serde_json::Value> {
        jsonwebtoken::decode::<serde_json::Value>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::TokenInvalid(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use venue_booking_testing::test_clock;
    use venue_booking_core::environment::Clock;

    fn codec() -> TokenCodec {
        TokenCodec::new(&TokenConfig::new("test-secret"))
    }

    #[test]
    fn test_issue_then_verify_yields_claims() {
        let now = test_clock().now();
        let token = codec()
            .issue(&Identity::new("alice", Role::Artist), now)
            .unwrap();

        let claims = Claims::from_payload(codec().verify(&token).unwrap()).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, Role::Artist);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.is_expired_at(now));
        assert!(claims.is_expired_at(now + chrono::Duration::hours(1)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenCodec::new(&TokenConfig::new("other-secret"))
            .issue(&Identity::new("alice", Role::Artist), test_clock().now())
            .unwrap();

        assert!(matches!(codec().verify(&token), Err(AuthError::TokenInvalid(_))));
        assert!(matches!(codec().verify("not-a-token"), Err(AuthError::TokenInvalid(_))));
    }

    #[test]
    fn test_missing_or_mistyped_claims_are_malformed() {
        let missing_role = serde_json::json!({ "username": "alice", "iat": 1, "exp": 2 });
        let bad_role = serde_json::json!({ "username": "alice", "role": "admin", "iat": 1, "exp": 2 });
        let bad_exp = serde_json::json!({ "username": "alice", "role": "artist", "iat": 1, "exp": "soon" });

        for payload in [missing_role, bad_role, bad_exp] {
            assert!(matches!(
                Claims::from_payload(payload),
                Err(AuthError::MalformedClaims(_))
            ));
        }
    }
}
