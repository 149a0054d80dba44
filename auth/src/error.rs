//! Error types for token authentication and credential handling.

use thiserror::Error;
use venue_booking_core::BookingError;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Failure modes of the token authenticator and password checks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Credential Errors
    // ═══════════════════════════════════════════════════════════
    /// Signature, algorithm or token structure is invalid.
    #[error("Invalid token: {0}")]
    TokenInvalid(String),

    /// Token is past its expiry.
    #[error("Token has expired")]
    TokenExpired,

    /// Token is on the revocation list.
    #[error("Token has been revoked")]
    TokenRevoked,

    /// Signature is valid but a claim is missing or has the wrong type.
    #[error("Malformed claims: {0}")]
    MalformedClaims(String),

    /// Username or password did not match.
    #[error("Invalid credentials")]
    InvalidCredentials,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════
    /// Revocation list storage failed.
    #[error("Revocation list I/O error: {0}")]
    Storage(String),

    /// Signing or hashing failed.
    #[error("Crypto error: {0}")]
    Crypto(String),
}

impl From<AuthError> for BookingError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::TokenInvalid(_)
            | AuthError::TokenExpired
            | AuthError::TokenRevoked
            | AuthError::InvalidCredentials => Self::Unauthorized,
            AuthError::MalformedClaims(detail) => Self::MalformedCredential(detail),
            AuthError::Storage(detail) | AuthError::Crypto(detail) => Self::Internal(detail),
        }
    }
}
