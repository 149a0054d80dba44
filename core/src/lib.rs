//! # Venue Booking Core
//!
//! Core types and contracts for the venue booking consistency engine.
//!
//! This crate holds everything the rest of the workspace agrees on:
//!
//! - **Types**: identifiers, users, venues, timeslots, events, reservations
//! - **Errors**: the booking error taxonomy shared by every layer
//! - **Store**: the Capability Store traits (transactions, row locks,
//!   conditional updates) implemented by `PostgreSQL` and in-memory backends
//! - **Policy**: the role-based authorization table
//! - **Environment**: injected dependencies such as the clock
//!
//! ## Architecture Principles
//!
//! - The Capability Store is the sole owner of durable state
//! - Components touch it only through transactions, never through caches
//! - Authorization is a pure function, decided before any mutation
//!
//! ## Example
//!
//! ```
//! use venue_booking_core::policy::{decide, Decision, Operation, Ownership};
//! use venue_booking_core::types::Role;
//!
//! assert_eq!(
//!     decide(Operation::CreateReservation, Role::Audience, Ownership::NotApplicable),
//!     Decision::Allow,
//! );
//! assert_eq!(
//!     decide(Operation::CreateEvent, Role::Audience, Ownership::NotApplicable),
//!     Decision::Deny,
//! );
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

pub mod error;
pub mod policy;
pub mod store;
pub mod types;

pub use error::{BookingError, ConflictReason, Result};
pub use store::{CapabilityStore, StoreError, StoreTransaction};

/// Environment module - injected dependencies
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use venue_booking_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let _now = clock.now();
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
