//! Booking Orchestrator.
//!
//! Composes the allocator and the arbiter under the authorization policy.
//! Every operation resolves the caller, establishes ownership from the
//! stored resource, and authorizes before any mutating work begins.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Months, Utc};
use venue_booking_core::environment::{Clock, SystemClock};
use venue_booking_core::policy::{Operation, Ownership, authorize};
use venue_booking_core::store::{CapabilityStore, StoreTransaction};
use venue_booking_core::types::{
    Event, EventDraft, EventId, EventSummary, EventWindow, Identity, Page, Reservation,
    ReservationId, ReservationScope, Timeslot, User, UserId, VenueId,
};
use venue_booking_core::{BookingError, ConflictReason, Result};

use crate::allocator::allocate;
use crate::arbiter;
use crate::metrics::{record_event, record_reservation};

/// Resolve the authenticated caller to a stored user.
///
/// # Errors
///
/// Returns `Unauthorized` if the username no longer resolves or the stored
/// role differs from the credential's.
pub async fn resolve_caller<S: CapabilityStore>(store: &S, identity: &Identity) -> Result<User> {
    match store.user_by_username(&identity.username).await? {
        Some(user) if user.role == identity.role => Ok(user),
        _ => {
            tracing::debug!(username = %identity.username, "Credential does not match a user");
            Err(BookingError::Unauthorized)
        },
    }
}

/// Event and reservation operations for authenticated callers.
pub struct BookingService<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: Clone> Clone for BookingService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: CapabilityStore> BookingService<S> {
    /// Create a service using the system clock.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Create a service with an injected clock.
    #[must_use]
    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Events
    // ═══════════════════════════════════════════════════════════════════════

    /// Publish an event on one or two contiguous timeslots.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `Forbidden` (not an artist), `InvalidInput`,
    /// `NotFound` (genre or timeslot), `Conflict(TimeslotTaken)`, `Internal`.
    pub async fn create_event(&self, identity: &Identity, draft: EventDraft) -> Result<Event> {
        let result = self.try_create_event(identity, draft).await;
        record_event("create", &result);
        result
    }

    async fn try_create_event(&self, identity: &Identity, draft: EventDraft) -> Result<Event> {
        let caller = resolve_caller(&self.store, identity).await?;
        authorize(Operation::CreateEvent, caller.role, Ownership::NotApplicable)?;
        let window = draft.validate()?;
        self.require_genre(&draft).await?;

        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let written = insert_new_event(&mut tx, caller.id, draft, window, now).await;
        let event = finish(tx, written).await?;
        tracing::info!(
            event_id = %event.id,
            artist_id = %event.artist_id,
            venue_id = %event.venue_id,
            "Event created"
        );
        Ok(event)
    }

    /// Replace an event's details and timeslots.
    ///
    /// Previously bound slots are released before the new ones are claimed.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `NotFound`, `Forbidden` (not the owning artist or an
    /// owner), `InvalidInput`, `Conflict(TimeslotTaken)`,
    /// `Conflict(OverCapacity)` when moving to a venue that cannot seat the
    /// existing reservations, `Internal`.
    pub async fn update_event(
        &self,
        identity: &Identity,
        event_id: EventId,
        draft: EventDraft,
    ) -> Result<Event> {
        let result = self.try_update_event(identity, event_id, draft).await;
        record_event("update", &result);
        result
    }

    async fn try_update_event(
        &self,
        identity: &Identity,
        event_id: EventId,
        draft: EventDraft,
    ) -> Result<Event> {
        let caller = resolve_caller(&self.store, identity).await?;
        let existing = self
            .store
            .event(event_id)
            .await?
            .ok_or(BookingError::not_found("event"))?;
        authorize(
            Operation::UpdateEvent,
            caller.role,
            Ownership::from_match(existing.artist_id == caller.id),
        )?;
        let window = draft.validate()?;
        self.require_genre(&draft).await?;

        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let written = rewrite_event(&mut tx, event_id, draft, window, now).await;
        let event = finish(tx, written).await?;
        tracing::info!(event_id = %event.id, venue_id = %event.venue_id, "Event updated");
        Ok(event)
    }

    /// Get an event with its timeslots and seat occupancy. Public.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Internal`.
    pub async fn get_event(&self, event_id: EventId) -> Result<EventSummary> {
        self.store
            .event_summary(event_id)
            .await?
            .ok_or(BookingError::not_found("event"))
    }

    /// List events starting today or later, soonest first. Public.
    ///
    /// `artist_id` narrows the listing to one artist's events. Without a
    /// page the first 12 are returned.
    ///
    /// # Errors
    ///
    /// `Internal`.
    pub async fn list_events(
        &self,
        artist_id: Option<UserId>,
        page: Option<Page>,
    ) -> Result<Vec<EventSummary>> {
        let now = self.clock.now();
        let today = start_of_day(now).unwrap_or(now);
        let page = page.unwrap_or(Page::first(Page::EVENTS_LIMIT));
        Ok(self.store.list_events(artist_id, today, page).await?)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Timeslots
    // ═══════════════════════════════════════════════════════════════════════

    /// List the free timeslots of a venue that start within `[from, to]`.
    ///
    /// `from` defaults to now and `to` to the last second of the current
    /// month. Only artists and owners may look.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `NotFound` (venue), `Forbidden`, `InvalidInput`
    /// (`from` after `to`), `Internal`.
    pub async fn list_free_timeslots(
        &self,
        identity: &Identity,
        venue_id: VenueId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Timeslot>> {
        let caller = resolve_caller(&self.store, identity).await?;
        self.store
            .venue(venue_id)
            .await?
            .ok_or(BookingError::not_found("venue"))?;
        authorize(Operation::ListTimeslots, caller.role, Ownership::NotApplicable)?;

        let now = self.clock.now();
        let from = from.unwrap_or(now);
        let to = match to {
            Some(to) => to,
            None => end_of_month(now).ok_or_else(|| {
                BookingError::Internal("cannot compute the end of the month".to_string())
            })?,
        };
        if from > to {
            return Err(BookingError::InvalidInput(
                "from must not be after to".to_string(),
            ));
        }

        Ok(self.store.free_timeslots(venue_id, from, to).await?)
    }

    async fn require_genre(&self, draft: &EventDraft) -> Result<()> {
        self.store
            .genre(draft.genre_id)
            .await?
            .map(|_| ())
            .ok_or(BookingError::not_found("genre"))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Reservations
    // ═══════════════════════════════════════════════════════════════════════

    /// Reserve seats for the calling audience member.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `Forbidden` (not audience), `InvalidInput`, `NotFound`,
    /// `Conflict(AlreadyReserved | SoldOut)`, `Internal`.
    pub async fn create_reservation(
        &self,
        identity: &Identity,
        event_id: EventId,
        seat_count: i64,
    ) -> Result<Reservation> {
        let result = async {
            let caller = resolve_caller(&self.store, identity).await?;
            authorize(Operation::CreateReservation, caller.role, Ownership::NotApplicable)?;
            arbiter::reserve(&self.store, event_id, caller.id, seat_count, self.clock.now()).await
        }
        .await;
        record_reservation("create", &result);
        result
    }

    /// Get a reservation held by the caller (or any, for owners).
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `NotFound`, `Forbidden`, `Internal`.
    pub async fn get_reservation(
        &self,
        identity: &Identity,
        reservation_id: ReservationId,
    ) -> Result<Reservation> {
        self.owned_reservation(identity, reservation_id, Operation::ReadReservation)
            .await
    }

    /// Cancel a reservation held by the caller (or any, for owners).
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `NotFound`, `Forbidden`, `Internal`.
    pub async fn cancel_reservation(
        &self,
        identity: &Identity,
        reservation_id: ReservationId,
    ) -> Result<()> {
        let result = async {
            self.owned_reservation(identity, reservation_id, Operation::CancelReservation)
                .await?;
            arbiter::cancel(&self.store, reservation_id).await
        }
        .await;
        record_reservation("cancel", &result);
        result
    }

    async fn owned_reservation(
        &self,
        identity: &Identity,
        reservation_id: ReservationId,
        operation: Operation,
    ) -> Result<Reservation> {
        let caller = resolve_caller(&self.store, identity).await?;
        let reservation = self
            .store
            .reservation(reservation_id)
            .await?
            .ok_or(BookingError::not_found("reservation"))?;
        authorize(
            operation,
            caller.role,
            Ownership::from_match(reservation.user_id == caller.id),
        )?;
        Ok(reservation)
    }

    /// List reservations of a user or of an event.
    ///
    /// Without a page, user listings return the first 5 and event listings
    /// the first 10.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `NotFound` (user or event), `Forbidden`, `Internal`.
    pub async fn list_reservations(
        &self,
        identity: &Identity,
        scope: ReservationScope,
        page: Option<Page>,
    ) -> Result<Vec<Reservation>> {
        let caller = resolve_caller(&self.store, identity).await?;

        let page = match scope {
            ReservationScope::ByUser(user_id) => {
                let user = self
                    .store
                    .user(user_id)
                    .await?
                    .ok_or(BookingError::not_found("user"))?;
                authorize(
                    Operation::ListUserReservations,
                    caller.role,
                    Ownership::from_match(user.id == caller.id),
                )?;
                page.unwrap_or(Page::first(Page::USER_RESERVATIONS_LIMIT))
            },
            ReservationScope::ByEvent(event_id) => {
                let event = self
                    .store
                    .event(event_id)
                    .await?
                    .ok_or(BookingError::not_found("event"))?;
                authorize(
                    Operation::ListEventReservations,
                    caller.role,
                    Ownership::from_match(event.artist_id == caller.id),
                )?;
                page.unwrap_or(Page::first(Page::EVENT_RESERVATIONS_LIMIT))
            },
        };

        Ok(self.store.list_reservations(scope, page).await?)
    }
}

async fn insert_new_event<T: StoreTransaction>(
    tx: &mut T,
    artist_id: UserId,
    draft: EventDraft,
    window: EventWindow,
    now: DateTime<Utc>,
) -> Result<Event> {
    let event_id = EventId::new();
    // Claiming before the insert relies on the deferred timeslot foreign key.
    let allocation = allocate(tx, &draft.timeslot_ids, window, event_id, None).await?;
    let event = Event {
        id: event_id,
        artist_id,
        venue_id: allocation.venue_id,
        genre_id: draft.genre_id,
        name: draft.name,
        start_at: window.start(),
        end_at: window.end(),
        price: draft.price,
        created_at: now,
        updated_at: now,
    };
    tx.insert_event(&event).await?;
    Ok(event)
}

async fn rewrite_event<T: StoreTransaction>(
    tx: &mut T,
    event_id: EventId,
    draft: EventDraft,
    window: EventWindow,
    now: DateTime<Utc>,
) -> Result<Event> {
    let current = tx
        .lock_event(event_id)
        .await?
        .ok_or(BookingError::not_found("event"))?;
    let allocation = allocate(tx, &draft.timeslot_ids, window, event_id, Some(event_id)).await?;
    let moved = allocation.venue_id != current.venue_id;
    let event = Event {
        venue_id: allocation.venue_id,
        genre_id: draft.genre_id,
        name: draft.name,
        start_at: window.start(),
        end_at: window.end(),
        price: draft.price,
        updated_at: now,
        ..current
    };
    tx.update_event(&event).await?;

    if moved {
        // The event row is already locked, so no admission can slip in
        // between this check and the commit.
        let capacity = tx
            .lock_event_for_admission(event_id)
            .await?
            .ok_or(BookingError::not_found("event"))?;
        let reserved = tx.reserved_seats(event_id).await?;
        if reserved > capacity {
            tracing::warn!(
                event_id = %event_id,
                venue_id = %event.venue_id,
                reserved,
                capacity,
                "Venue too small for existing reservations"
            );
            return Err(BookingError::Conflict(ConflictReason::OverCapacity));
        }
    }
    Ok(event)
}

fn start_of_day(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    Some(now.date_naive().and_hms_opt(0, 0, 0)?.and_utc())
}

/// Last second of `now`'s calendar month.
fn end_of_month(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let first = now.date_naive().with_day(1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    Some(last.and_hms_opt(23, 59, 59)?.and_utc())
}

/// Commit on success, roll back on failure.
async fn finish<T: StoreTransaction, V>(tx: T, outcome: Result<V>) -> Result<V> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        },
        Err(e) => {
            let _ = tx.rollback().await;
            Err(e)
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use venue_booking_testing::datetime;

    #[test]
    fn test_end_of_month() {
        assert_eq!(end_of_month(datetime(1, 10, 0, 0)), Some(datetime(30, 23, 59, 59)));
    }

    #[test]
    fn test_start_of_day() {
        assert_eq!(start_of_day(datetime(7, 13, 45, 10)), Some(datetime(7, 0, 0, 0)));
    }
}
