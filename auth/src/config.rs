//! Token authenticator configuration.
//!
//! Values are provided by the application (see the web crate's
//! `Config::from_env`), not hardcoded.

use chrono::Duration;

/// Development signing secret. Never use in production.
pub const DEVELOPMENT_SECRET: &str = "venue-booking-development-secret";

/// Signed-claims token configuration.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Shared HMAC secret used to sign and verify tokens.
    pub secret: String,

    /// Token time-to-live.
    ///
    /// Default: 1 hour. Also bounds how long a revoked token stays relevant.
    pub ttl: Duration,
}

impl TokenConfig {
    /// Create a configuration with the given secret.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::hours(1),
        }
    }

    /// Set token time-to-live.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the signing secret.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self::new(DEVELOPMENT_SECRET)
    }
}
