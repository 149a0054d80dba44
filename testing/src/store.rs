//! In-memory Capability Store.
//!
//! All tables sit behind one async mutex. A transaction holds that mutex
//! from `begin` until it commits, rolls back or is dropped, so every
//! transaction is serialized against every other store access. Rollback
//! restores the snapshot taken at `begin`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use venue_booking_core::store::{CapabilityStore, StoreError, StoreResult, StoreTransaction};
use venue_booking_core::types::{
    Event, EventId, EventSummary, Genre, GenreId, Page, Reservation, ReservationId,
    ReservationScope, Role, Timeslot, TimeslotId, User, UserId, Venue, VenueId,
};

const USERNAME_CONSTRAINT: &str = "users_username_key";
const RESERVATION_CONSTRAINT: &str = "reservations_user_id_event_id_key";

#[derive(Debug, Clone, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    venues: HashMap<VenueId, Venue>,
    genres: HashMap<GenreId, Genre>,
    timeslots: HashMap<TimeslotId, Timeslot>,
    events: HashMap<EventId, Event>,
    // Insertion order doubles as creation order for listings.
    reservations: Vec<Reservation>,
}

impl Tables {
    fn summary(&self, id: EventId) -> Option<EventSummary> {
        let event = self.events.get(&id)?.clone();
        let capacity = self.venues.get(&event.venue_id).map_or(0, |v| v.capacity);

        let mut slots: Vec<&Timeslot> = self
            .timeslots
            .values()
            .filter(|slot| slot.event_id == Some(id))
            .collect();
        slots.sort_by_key(|slot| slot.start_at);

        Some(EventSummary {
            timeslot_ids: slots.iter().map(|slot| slot.id).collect(),
            capacity,
            reserved_seats: self.reserved_seats(id),
            event,
        })
    }

    fn reserved_seats(&self, event_id: EventId) -> i64 {
        self.reservations
            .iter()
            .filter(|r| r.event_id == event_id)
            .map(|r| r.seat_count)
            .sum()
    }
}

/// In-memory [`CapabilityStore`] for tests.
///
/// Cloning shares the underlying tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCapabilityStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryCapabilityStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Seeding
    // ═══════════════════════════════════════════════════════════════════════

    /// Insert a venue.
    pub async fn seed_venue(&self, name: &str, capacity: i64) -> VenueId {
        let venue = Venue {
            id: VenueId::new(),
            name: name.to_string(),
            capacity,
        };
        let id = venue.id;
        self.tables.lock().await.venues.insert(id, venue);
        id
    }

    /// Insert a genre.
    pub async fn seed_genre(&self, name: &str) -> GenreId {
        let genre = Genre {
            id: GenreId::new(),
            name: name.to_string(),
        };
        let id = genre.id;
        self.tables.lock().await.genres.insert(id, genre);
        id
    }

    /// Insert a free timeslot. `end_at` is the slot's last instant.
    pub async fn seed_timeslot(
        &self,
        venue_id: VenueId,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    ) -> TimeslotId {
        let slot = Timeslot {
            id: TimeslotId::new(),
            venue_id,
            event_id: None,
            start_at,
            end_at,
        };
        let id = slot.id;
        self.tables.lock().await.timeslots.insert(id, slot);
        id
    }

    /// Insert a user that cannot log in (no usable password).
    pub async fn seed_user(&self, username: &str, role: Role) -> User {
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            username: username.to_string(),
            role,
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().await.users.insert(user.id, user.clone());
        user
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Inspection
    // ═══════════════════════════════════════════════════════════════════════

    /// Current state of a timeslot.
    pub async fn timeslot(&self, id: TimeslotId) -> Option<Timeslot> {
        self.tables.lock().await.timeslots.get(&id).cloned()
    }

    /// Every committed reservation for an event.
    pub async fn reservations_for(&self, event_id: EventId) -> Vec<Reservation> {
        self.tables
            .lock()
            .await
            .reservations
            .iter()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect()
    }

    /// Number of committed events.
    pub async fn event_count(&self) -> usize {
        self.tables.lock().await.events.len()
    }
}

impl CapabilityStore for InMemoryCapabilityStore {
    type Tx = InMemoryTransaction;

    fn begin(&self) -> impl Future<Output = StoreResult<Self::Tx>> + Send {
        let tables = Arc::clone(&self.tables);

        async move {
            let guard = tables.lock_owned().await;
            let snapshot = guard.clone();
            Ok(InMemoryTransaction {
                guard,
                snapshot: Some(snapshot),
            })
        }
    }

    fn user(&self, id: UserId) -> impl Future<Output = StoreResult<Option<User>>> + Send {
        let tables = Arc::clone(&self.tables);

        async move { Ok(tables.lock().await.users.get(&id).cloned()) }
    }

    fn user_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = StoreResult<Option<User>>> + Send {
        let tables = Arc::clone(&self.tables);
        let username = username.to_string();

        async move {
            Ok(tables
                .lock()
                .await
                .users
                .values()
                .find(|u| u.username == username)
                .cloned())
        }
    }

    fn insert_user(&self, user: &User) -> impl Future<Output = StoreResult<()>> + Send {
        let tables = Arc::clone(&self.tables);
        let user = user.clone();

        async move {
            let mut tables = tables.lock().await;
            if tables.users.values().any(|u| u.username == user.username) {
                return Err(StoreError::UniqueViolation(USERNAME_CONSTRAINT.to_string()));
            }
            tables.users.insert(user.id, user);
            Ok(())
        }
    }

    fn venue(&self, id: VenueId) -> impl Future<Output = StoreResult<Option<Venue>>> + Send {
        let tables = Arc::clone(&self.tables);

        async move { Ok(tables.lock().await.venues.get(&id).cloned()) }
    }

    fn free_timeslots(
        &self,
        venue_id: VenueId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<Vec<Timeslot>>> + Send {
        let tables = Arc::clone(&self.tables);

        async move {
            let mut slots: Vec<Timeslot> = tables
                .lock()
                .await
                .timeslots
                .values()
                .filter(|slot| {
                    slot.venue_id == venue_id
                        && slot.is_free()
                        && from <= slot.start_at
                        && slot.start_at <= to
                })
                .cloned()
                .collect();
            slots.sort_by_key(|slot| (slot.start_at, slot.id));
            Ok(slots)
        }
    }

    fn event(&self, id: EventId) -> impl Future<Output = StoreResult<Option<Event>>> + Send {
        let tables = Arc::clone(&self.tables);

        async move { Ok(tables.lock().await.events.get(&id).cloned()) }
    }

    fn event_summary(
        &self,
        id: EventId,
    ) -> impl Future<Output = StoreResult<Option<EventSummary>>> + Send {
        let tables = Arc::clone(&self.tables);

        async move { Ok(tables.lock().await.summary(id)) }
    }

    fn list_events(
        &self,
        artist_id: Option<UserId>,
        from: DateTime<Utc>,
        page: Page,
    ) -> impl Future<Output = StoreResult<Vec<EventSummary>>> + Send {
        let tables = Arc::clone(&self.tables);

        async move {
            let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
            let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
            let tables = tables.lock().await;

            let mut events: Vec<&Event> = tables
                .events
                .values()
                .filter(|e| e.start_at >= from && artist_id.is_none_or(|id| e.artist_id == id))
                .collect();
            events.sort_by_key(|e| (e.start_at, e.id));

            Ok(events
                .into_iter()
                .skip(offset)
                .take(limit)
                .filter_map(|e| tables.summary(e.id))
                .collect())
        }
    }

    fn genre(&self, id: GenreId) -> impl Future<Output = StoreResult<Option<Genre>>> + Send {
        let tables = Arc::clone(&self.tables);

        async move { Ok(tables.lock().await.genres.get(&id).cloned()) }
    }

    fn reservation(
        &self,
        id: ReservationId,
    ) -> impl Future<Output = StoreResult<Option<Reservation>>> + Send {
        let tables = Arc::clone(&self.tables);

        async move {
            Ok(tables
                .lock()
                .await
                .reservations
                .iter()
                .find(|r| r.id == id)
                .cloned())
        }
    }

    fn list_reservations(
        &self,
        scope: ReservationScope,
        page: Page,
    ) -> impl Future<Output = StoreResult<Vec<Reservation>>> + Send {
        let tables = Arc::clone(&self.tables);

        async move {
            let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
            let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);

            Ok(tables
                .lock()
                .await
                .reservations
                .iter()
                .filter(|r| match scope {
                    ReservationScope::ByUser(user_id) => r.user_id == user_id,
                    ReservationScope::ByEvent(event_id) => r.event_id == event_id,
                })
                .skip(offset)
                .take(limit)
                .cloned()
                .collect())
        }
    }

    fn delete_reservation(
        &self,
        id: ReservationId,
    ) -> impl Future<Output = StoreResult<bool>> + Send {
        let tables = Arc::clone(&self.tables);

        async move {
            let mut tables = tables.lock().await;
            let before = tables.reservations.len();
            tables.reservations.retain(|r| r.id != id);
            Ok(tables.reservations.len() < before)
        }
    }
}

/// Transaction over [`InMemoryCapabilityStore`].
///
/// Holds the store-wide lock for its whole lifetime.
#[derive(Debug)]
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    // `None` once committed.
    snapshot: Option<Tables>,
}

impl InMemoryTransaction {
    fn restore(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
        }
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        self.restore();
    }
}

impl StoreTransaction for InMemoryTransaction {
    fn lock_timeslots(
        &mut self,
        ids: &[TimeslotId],
        bound_to: Option<EventId>,
    ) -> impl Future<Output = StoreResult<Vec<Timeslot>>> + Send {
        let mut slots: Vec<Timeslot> = self
            .guard
            .timeslots
            .values()
            .filter(|slot| {
                ids.contains(&slot.id) || (bound_to.is_some() && slot.event_id == bound_to)
            })
            .cloned()
            .collect();
        slots.sort_by_key(|slot| slot.id);
        async move { Ok(slots) }
    }

    fn release_timeslots(
        &mut self,
        event_id: EventId,
    ) -> impl Future<Output = StoreResult<u64>> + Send {
        let mut released = 0;
        for slot in self.guard.timeslots.values_mut() {
            if slot.event_id == Some(event_id) {
                slot.event_id = None;
                released += 1;
            }
        }
        async move { Ok(released) }
    }

    fn claim_timeslot(
        &mut self,
        id: TimeslotId,
        event_id: EventId,
    ) -> impl Future<Output = StoreResult<bool>> + Send {
        let claimed = match self.guard.timeslots.get_mut(&id) {
            Some(slot) if slot.is_free() => {
                slot.event_id = Some(event_id);
                true
            },
            _ => false,
        };
        async move { Ok(claimed) }
    }

    fn lock_event(
        &mut self,
        id: EventId,
    ) -> impl Future<Output = StoreResult<Option<Event>>> + Send {
        let event = self.guard.events.get(&id).cloned();
        async move { Ok(event) }
    }

    fn insert_event(&mut self, event: &Event) -> impl Future<Output = StoreResult<()>> + Send {
        let result = if self.guard.events.contains_key(&event.id) {
            Err(StoreError::UniqueViolation("events_pkey".to_string()))
        } else {
            self.guard.events.insert(event.id, event.clone());
            Ok(())
        };
        async move { result }
    }

    fn update_event(&mut self, event: &Event) -> impl Future<Output = StoreResult<()>> + Send {
        let result = match self.guard.events.get_mut(&event.id) {
            Some(existing) => {
                *existing = event.clone();
                Ok(())
            },
            None => Err(StoreError::Database(format!("event {} does not exist", event.id))),
        };
        async move { result }
    }

    fn lock_event_for_admission(
        &mut self,
        event_id: EventId,
    ) -> impl Future<Output = StoreResult<Option<i64>>> + Send {
        let capacity = self
            .guard
            .events
            .get(&event_id)
            .and_then(|event| self.guard.venues.get(&event.venue_id))
            .map(|venue| venue.capacity);
        async move { Ok(capacity) }
    }

    fn find_reservation_for(
        &mut self,
        event_id: EventId,
        user_id: UserId,
    ) -> impl Future<Output = StoreResult<Option<Reservation>>> + Send {
        let found = self
            .guard
            .reservations
            .iter()
            .find(|r| r.event_id == event_id && r.user_id == user_id)
            .cloned();
        async move { Ok(found) }
    }

    fn reserved_seats(
        &mut self,
        event_id: EventId,
    ) -> impl Future<Output = StoreResult<i64>> + Send {
        let seats = self.guard.reserved_seats(event_id);
        async move { Ok(seats) }
    }

    fn insert_reservation(
        &mut self,
        reservation: &Reservation,
    ) -> impl Future<Output = StoreResult<()>> + Send {
        let duplicate = self
            .guard
            .reservations
            .iter()
            .any(|r| r.event_id == reservation.event_id && r.user_id == reservation.user_id);
        let result = if duplicate {
            Err(StoreError::UniqueViolation(RESERVATION_CONSTRAINT.to_string()))
        } else {
            self.guard.reservations.push(reservation.clone());
            Ok(())
        };
        async move { result }
    }

    fn commit(mut self) -> impl Future<Output = StoreResult<()>> + Send {
        self.snapshot = None;
        async move {
            drop(self);
            Ok(())
        }
    }

    fn rollback(mut self) -> impl Future<Output = StoreResult<()>> + Send {
        self.restore();
        async move {
            drop(self);
            Ok(())
        }
    }
}
