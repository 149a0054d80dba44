//! Capability Store contracts.
//!
//! The Capability Store is the only owner of durable state. Components read
//! and mutate it through these traits and never cache entities across
//! requests. Two backends implement them: `PostgreSQL` (row locks and
//! conditional updates) and an in-memory store for tests.
//!
//! Every multi-statement mutation runs inside a [`StoreTransaction`], which
//! either commits fully or rolls back fully. Dropping an uncommitted
//! transaction rolls it back.

use crate::types::{
    Event, EventId, EventSummary, Genre, GenreId, Page, Reservation, ReservationId,
    ReservationScope, Timeslot, TimeslotId, User, UserId, Venue, VenueId,
};
use chrono::{DateTime, Utc};
use std::future::Future;
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Capability Store failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Any other backend failure.
    #[error("Database error: {0}")]
    Database(String),
}

/// Durable store with transactions and non-transactional point reads.
///
/// Implementations must not be called re-entrantly from inside one of their
/// own open transactions; a backend may serialize all access per transaction.
pub trait CapabilityStore: Send + Sync {
    /// Transaction handle.
    type Tx: StoreTransaction;

    /// Begin a transaction.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot open a transaction.
    fn begin(&self) -> impl Future<Output = StoreResult<Self::Tx>> + Send;

    // ═══════════════════════════════════════════════════════════════════════
    // Users
    // ═══════════════════════════════════════════════════════════════════════

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn user(&self, id: UserId) -> impl Future<Output = StoreResult<Option<User>>> + Send;

    /// Get a user by username.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn user_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = StoreResult<Option<User>>> + Send;

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] if the username is taken.
    fn insert_user(&self, user: &User) -> impl Future<Output = StoreResult<()>> + Send;

    // ═══════════════════════════════════════════════════════════════════════
    // Venues & Timeslots
    // ═══════════════════════════════════════════════════════════════════════

    /// Get a venue by ID.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn venue(&self, id: VenueId) -> impl Future<Output = StoreResult<Option<Venue>>> + Send;

    /// Unbound timeslots of a venue starting within `[from, to]`, by start.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn free_timeslots(
        &self,
        venue_id: VenueId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<Vec<Timeslot>>> + Send;

    // ═══════════════════════════════════════════════════════════════════════
    // Events & Genres
    // ═══════════════════════════════════════════════════════════════════════

    /// Get an event by ID.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn event(&self, id: EventId) -> impl Future<Output = StoreResult<Option<Event>>> + Send;

    /// Get an event with its bound timeslots, capacity and reserved seats.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn event_summary(
        &self,
        id: EventId,
    ) -> impl Future<Output = StoreResult<Option<EventSummary>>> + Send;

    /// Events starting at or after `from`, by start, optionally of one artist.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn list_events(
        &self,
        artist_id: Option<UserId>,
        from: DateTime<Utc>,
        page: Page,
    ) -> impl Future<Output = StoreResult<Vec<EventSummary>>> + Send;

    /// Get a genre by ID.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn genre(&self, id: GenreId) -> impl Future<Output = StoreResult<Option<Genre>>> + Send;

    // ═══════════════════════════════════════════════════════════════════════
    // Reservations
    // ═══════════════════════════════════════════════════════════════════════

    /// Get a reservation by ID.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn reservation(
        &self,
        id: ReservationId,
    ) -> impl Future<Output = StoreResult<Option<Reservation>>> + Send;

    /// List reservations in creation order.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn list_reservations(
        &self,
        scope: ReservationScope,
        page: Page,
    ) -> impl Future<Output = StoreResult<Vec<Reservation>>> + Send;

    /// Hard-delete a reservation.
    ///
    /// # Returns
    ///
    /// `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns error if the statement fails.
    fn delete_reservation(
        &self,
        id: ReservationId,
    ) -> impl Future<Output = StoreResult<bool>> + Send;
}

/// An open all-or-nothing transaction.
pub trait StoreTransaction: Send + Sized {
    /// Fetch the timeslots in `ids` plus every timeslot bound to `bound_to`,
    /// holding exclusive row locks on all of them until the transaction ends.
    ///
    /// All rows are locked in one pass in id order, so two transactions
    /// locking overlapping sets cannot deadlock. Unknown ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn lock_timeslots(
        &mut self,
        ids: &[TimeslotId],
        bound_to: Option<EventId>,
    ) -> impl Future<Output = StoreResult<Vec<Timeslot>>> + Send;

    /// Unbind every timeslot currently bound to `event_id`.
    ///
    /// # Returns
    ///
    /// Number of released slots.
    ///
    /// # Errors
    ///
    /// Returns error if the statement fails.
    fn release_timeslots(
        &mut self,
        event_id: EventId,
    ) -> impl Future<Output = StoreResult<u64>> + Send;

    /// Bind a timeslot to `event_id`, only if it is currently unbound.
    ///
    /// # Returns
    ///
    /// `false` if the slot was already bound (zero rows affected).
    ///
    /// # Errors
    ///
    /// Returns error if the statement fails.
    fn claim_timeslot(
        &mut self,
        id: TimeslotId,
        event_id: EventId,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Fetch an event, holding an exclusive row lock until the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn lock_event(
        &mut self,
        id: EventId,
    ) -> impl Future<Output = StoreResult<Option<Event>>> + Send;

    /// Insert an event row.
    ///
    /// # Errors
    ///
    /// Returns error if the statement fails.
    fn insert_event(&mut self, event: &Event) -> impl Future<Output = StoreResult<()>> + Send;

    /// Overwrite an existing event row.
    ///
    /// # Errors
    ///
    /// Returns error if the statement fails.
    fn update_event(&mut self, event: &Event) -> impl Future<Output = StoreResult<()>> + Send;

    /// Take the admission lock for an event and return its venue capacity.
    ///
    /// Serializes every reservation attempt on the same event until the
    /// transaction ends. Returns `None` if the event does not exist.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn lock_event_for_admission(
        &mut self,
        event_id: EventId,
    ) -> impl Future<Output = StoreResult<Option<i64>>> + Send;

    /// Get the reservation `user_id` holds for `event_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn find_reservation_for(
        &mut self,
        event_id: EventId,
        user_id: UserId,
    ) -> impl Future<Output = StoreResult<Option<Reservation>>> + Send;

    /// Sum of seat counts over all reservations for `event_id`.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn reserved_seats(
        &mut self,
        event_id: EventId,
    ) -> impl Future<Output = StoreResult<i64>> + Send;

    /// Insert a reservation row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] if the user already holds a
    /// reservation for the event.
    fn insert_reservation(
        &mut self,
        reservation: &Reservation,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Commit every effect of this transaction.
    ///
    /// # Errors
    ///
    /// Returns error if the commit fails; nothing is persisted in that case.
    fn commit(self) -> impl Future<Output = StoreResult<()>> + Send;

    /// Discard every effect of this transaction.
    ///
    /// # Errors
    ///
    /// Returns error if the backend reports a failure while rolling back.
    fn rollback(self) -> impl Future<Output = StoreResult<()>> + Send;
}
