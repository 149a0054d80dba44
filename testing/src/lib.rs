//! # Venue Booking Testing
//!
//! Testing utilities for the venue booking engine.
//!
//! This crate provides:
//! - An in-memory Capability Store with seeding and inspection helpers
//! - A fixed clock for deterministic timestamps and token expiry
//! - Seed fixtures (venues, adjacent timeslots, one user per role)
//!
//! ## Example
//!
//! ```
//! use venue_booking_testing::{BookingFixture, test_clock};
//! use venue_booking_core::environment::Clock;
//!
//! # tokio_test::block_on(async {
//! let fixture = BookingFixture::new(10).await;
//! assert_eq!(fixture.store.event_count().await, 0);
//! assert_eq!(test_clock().now(), test_clock().now());
//! # });
//! ```

use chrono::{DateTime, Utc};
use venue_booking_core::environment::Clock;

pub mod fixtures;
pub mod store;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use venue_booking_testing::mocks::FixedClock;
    /// use venue_booking_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Install a test tracing subscriber honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use fixtures::{BookingFixture, at, datetime};
pub use mocks::{FixedClock, test_clock};
pub use store::{InMemoryCapabilityStore, InMemoryTransaction};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[tokio::test]
    async fn test_fixture_seeds_adjacent_slots() {
        let fixture = BookingFixture::new(10).await;
        let morning = fixture.store.timeslot(fixture.morning).await;
        let noon = fixture.store.timeslot(fixture.noon).await;

        match (morning, noon) {
            (Some(morning), Some(noon)) => assert!(morning.is_followed_by(&noon)),
            _ => unreachable!("fixture slots are seeded"),
        }
    }
}
