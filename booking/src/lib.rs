//! # Venue Booking
//!
//! The booking consistency engine.
//!
//! - [`allocator`]: claims contiguous venue timeslots for an event without
//!   double-booking any slot
//! - [`arbiter`]: admits seat reservations without exceeding venue capacity
//!   or letting a user hold two reservations for one event
//! - [`orchestrator`]: composes both under role-based authorization
//! - [`accounts`]: sign-up, login, logout and credential checks
//!
//! Every multi-statement mutation runs in one Capability Store transaction
//! and either commits fully or rolls back fully.
//!
//! ## Example
//!
//! ```
//! use venue_booking::BookingService;
//! use venue_booking_core::types::{EventDraft, Identity, Role};
//! use venue_booking_testing::{BookingFixture, at};
//!
//! # tokio_test::block_on(async {
//! let fixture = BookingFixture::new(10).await;
//! let service = BookingService::new(fixture.store.clone());
//! let artist = Identity::new("artist", Role::Artist);
//!
//! let event = service
//!     .create_event(&artist, EventDraft {
//!         name: "Opening Night".to_string(),
//!         genre_id: fixture.genre_id,
//!         price: 3000,
//!         timeslot_ids: vec![fixture.morning, fixture.noon],
//!         start_at: at(10, 0, 0),
//!         end_at: at(12, 0, 0),
//!     })
//!     .await
//!     .unwrap();
//!
//! let audience = Identity::new("audience", Role::Audience);
//! let reservation = service.create_reservation(&audience, event.id, 4).await.unwrap();
//! assert_eq!(reservation.seat_count, 4);
//! # });
//! ```

pub mod accounts;
pub mod allocator;
pub mod arbiter;
pub mod metrics;
pub mod orchestrator;

pub use accounts::{AccountService, Session};
pub use allocator::{Allocation, allocate, validate_chain};
pub use crate::metrics::register_business_metrics;
pub use orchestrator::BookingService;
