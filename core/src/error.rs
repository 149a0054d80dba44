//! Error taxonomy shared by every booking component.

use crate::store::StoreError;
use thiserror::Error;

/// Result type alias for booking operations.
pub type Result<T> = std::result::Result<T, BookingError>;

/// Why a request lost to existing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// A requested timeslot is already bound to another event.
    TimeslotTaken,
    /// The user already holds a reservation for the event.
    AlreadyReserved,
    /// The requested seats do not fit in the remaining capacity.
    SoldOut,
    /// The username is already registered.
    UsernameTaken,
    /// The new venue cannot seat the reservations already made.
    OverCapacity,
}

impl ConflictReason {
    /// Client-facing description.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::TimeslotTaken => "Timeslot is already reserved",
            Self::AlreadyReserved => "Reservation already exists for this event",
            Self::SoldOut => "Tickets are all gone",
            Self::UsernameTaken => "Username is already taken",
            Self::OverCapacity => "Venue cannot seat the existing reservations",
        }
    }
}

/// Every failure mode a booking operation can surface.
///
/// Variants map one-to-one onto client-visible outcomes; the web layer
/// translates them into HTTP status codes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    // ═══════════════════════════════════════════════════════════
    // Caller Errors
    // ═══════════════════════════════════════════════════════════
    /// Missing, invalid, expired or revoked credential, or bad login.
    #[error("Unauthorized")]
    Unauthorized,

    /// Credential signature is valid but its payload is not.
    #[error("Malformed credential: {0}")]
    MalformedCredential(String),

    /// Authenticated but not permitted.
    #[error("Forbidden")]
    Forbidden,

    /// Referenced entity does not exist.
    #[error("{entity} not found")]
    NotFound {
        /// Kind of entity that was looked up
        entity: &'static str,
    },

    /// Request failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ═══════════════════════════════════════════════════════════
    // Contention
    // ═══════════════════════════════════════════════════════════
    /// Request lost to existing state.
    #[error("{}", .0.message())]
    Conflict(ConflictReason),

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════
    /// Unexpected store or runtime failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BookingError {
    /// Shorthand for [`BookingError::NotFound`].
    #[must_use]
    pub const fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    /// Shorthand for [`BookingError::Conflict`].
    #[must_use]
    pub const fn conflict(reason: ConflictReason) -> Self {
        Self::Conflict(reason)
    }

    /// Whether this error means the caller lost a race or a capacity check.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<StoreError> for BookingError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UniqueViolation(constraint) => {
                if constraint.contains("username") {
                    Self::Conflict(ConflictReason::UsernameTaken)
                } else {
                    Self::Conflict(ConflictReason::AlreadyReserved)
                }
            },
            StoreError::Database(message) => Self::Internal(message),
        }
    }
}
