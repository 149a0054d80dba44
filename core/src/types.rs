//! Domain types for the venue booking engine.
//!
//! Value objects and entities shared by the allocator, the arbiter, the
//! orchestrator and every Capability Store backend.

use crate::error::{BookingError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a user
    UserId
);
define_id!(
    /// Unique identifier for a venue
    VenueId
);
define_id!(
    /// Unique identifier for a genre
    GenreId
);
define_id!(
    /// Unique identifier for a timeslot
    TimeslotId
);
define_id!(
    /// Unique identifier for an event
    EventId
);
define_id!(
    /// Unique identifier for a reservation
    ReservationId
);

// ============================================================================
// Users & Roles
// ============================================================================

/// Role of a user. Immutable after the user is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Reserves seats for events.
    Audience,
    /// Publishes events bound to venue timeslots.
    Artist,
    /// Privileged operator; bypasses ownership checks.
    Owner,
}

impl Role {
    /// Lowercase wire/storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Audience => "audience",
            Self::Artist => "artist",
            Self::Owner => "owner",
        }
    }

    /// Whether a user may choose this role when signing up.
    ///
    /// Owners are provisioned out of band.
    #[must_use]
    pub const fn is_self_assignable(&self) -> bool {
        matches!(self, Self::Audience | Self::Artist)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "audience" => Ok(Self::Audience),
            "artist" => Ok(Self::Artist),
            "owner" => Ok(Self::Owner),
            other => Err(BookingError::InvalidInput(format!("unknown role: {other}"))),
        }
    }
}

/// Authenticated caller, as decoded from a verified credential.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique username.
    pub username: String,
    /// Role claimed by the credential.
    pub role: Role,
}

impl Identity {
    /// Create a new identity.
    #[must_use]
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}

/// A registered user.
///
/// Not serializable: the password credential never leaves the store layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    /// User ID.
    pub id: UserId,
    /// Unique username.
    pub username: String,
    /// Immutable role.
    pub role: Role,
    /// Argon2id PHC string, empty for accounts that cannot log in.
    pub password_hash: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Public view of a [`User`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User ID.
    pub id: UserId,
    /// Unique username.
    pub username: String,
    /// Role.
    pub role: Role,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

// ============================================================================
// Venues, Genres & Timeslots
// ============================================================================

/// A venue with an authoritative seat capacity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    /// Venue ID.
    pub id: VenueId,
    /// Display name.
    pub name: String,
    /// Seat capacity, never exceeded by accepted reservations.
    pub capacity: i64,
}

/// Event genre lookup entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    /// Genre ID.
    pub id: GenreId,
    /// Display name.
    pub name: String,
}

/// Resolution of timeslot boundaries, in seconds.
///
/// A slot's `end_at` is its last instant, so slot `[10:00:00, 10:59:59]` is
/// immediately followed by a slot starting at `11:00:00`.
pub const TIMESLOT_RESOLUTION_SECS: i64 = 1;

/// At most this many timeslots may be bound to one event.
pub const MAX_TIMESLOTS_PER_EVENT: usize = 2;

/// A fixed interval at a venue, bindable to at most one event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeslot {
    /// Timeslot ID.
    pub id: TimeslotId,
    /// Owning venue.
    pub venue_id: VenueId,
    /// Bound event, `None` when the slot is free.
    pub event_id: Option<EventId>,
    /// First instant of the slot.
    pub start_at: DateTime<Utc>,
    /// Last instant of the slot.
    pub end_at: DateTime<Utc>,
}

impl Timeslot {
    /// Whether no event holds this slot.
    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.event_id.is_none()
    }

    /// Exclusive end of the interval this slot covers.
    #[must_use]
    pub fn covered_until(&self) -> DateTime<Utc> {
        self.end_at + Duration::seconds(TIMESLOT_RESOLUTION_SECS)
    }

    /// Whether `next` starts exactly one resolution step after this slot ends.
    #[must_use]
    pub fn is_followed_by(&self, next: &Self) -> bool {
        self.covered_until() == next.start_at
    }
}

// ============================================================================
// Events
// ============================================================================

/// Half-open interval `[start, end)` an event occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl EventWindow {
    /// Create a window.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidInput`] unless `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(BookingError::InvalidInput(
                "event start must precede event end".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Inclusive start.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive end.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// A published event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event ID.
    pub id: EventId,
    /// Publishing artist.
    pub artist_id: UserId,
    /// Venue derived from the bound timeslots.
    pub venue_id: VenueId,
    /// Genre.
    pub genre_id: GenreId,
    /// Display name.
    pub name: String,
    /// Inclusive start.
    pub start_at: DateTime<Utc>,
    /// Exclusive end.
    pub end_at: DateTime<Utc>,
    /// Ticket price, always positive.
    pub price: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields of `CreateEvent` / `UpdateEvent`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    /// Display name.
    pub name: String,
    /// Genre.
    pub genre_id: GenreId,
    /// Ticket price.
    pub price: i64,
    /// Requested timeslots (1 to [`MAX_TIMESLOTS_PER_EVENT`]).
    pub timeslot_ids: Vec<TimeslotId>,
    /// Requested start.
    pub start_at: DateTime<Utc>,
    /// Requested end.
    pub end_at: DateTime<Utc>,
}

impl EventDraft {
    /// Check schema and range constraints and return the requested window.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidInput`] for an empty name, a
    /// non-positive price, zero, duplicate or more than
    /// [`MAX_TIMESLOTS_PER_EVENT`] timeslots, or a malformed window.
    pub fn validate(&self) -> Result<EventWindow> {
        if self.name.trim().is_empty() {
            return Err(BookingError::InvalidInput("event name is required".to_string()));
        }
        if self.price <= 0 {
            return Err(BookingError::InvalidInput("price must be positive".to_string()));
        }
        if self.timeslot_ids.is_empty() {
            return Err(BookingError::InvalidInput(
                "at least one timeslot is required".to_string(),
            ));
        }
        if self.timeslot_ids.len() > MAX_TIMESLOTS_PER_EVENT {
            return Err(BookingError::InvalidInput(format!(
                "at most {MAX_TIMESLOTS_PER_EVENT} timeslots per event"
            )));
        }
        let mut unique = self.timeslot_ids.clone();
        unique.sort_unstable();
        unique.dedup();
        if unique.len() != self.timeslot_ids.len() {
            return Err(BookingError::InvalidInput(
                "timeslot ids must be distinct".to_string(),
            ));
        }
        EventWindow::new(self.start_at, self.end_at)
    }
}

/// An event together with its bindings and seat occupancy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    /// The event row.
    #[serde(flatten)]
    pub event: Event,
    /// Timeslots currently bound to the event.
    pub timeslot_ids: Vec<TimeslotId>,
    /// Capacity of the event's venue.
    pub capacity: i64,
    /// Sum of seats over all reservations for the event.
    pub reserved_seats: i64,
}

// ============================================================================
// Reservations
// ============================================================================

/// Seats held by one user for one event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Reservation ID.
    pub id: ReservationId,
    /// Holder.
    pub user_id: UserId,
    /// Reserved event.
    pub event_id: EventId,
    /// Number of seats, always positive.
    pub seat_count: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Which reservations a listing covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReservationScope {
    /// All reservations held by a user.
    ByUser(UserId),
    /// All reservations for an event.
    ByEvent(EventId),
}

/// Limit/offset window over a listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    limit: i64,
    offset: i64,
}

impl Page {
    /// Default page size when listing a user's reservations.
    pub const USER_RESERVATIONS_LIMIT: i64 = 5;

    /// Default page size when listing an event's reservations.
    pub const EVENT_RESERVATIONS_LIMIT: i64 = 10;

    /// Default page size when listing upcoming events.
    pub const EVENTS_LIMIT: i64 = 12;

    /// Create a page.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidInput`] if either value is negative.
    pub fn new(limit: i64, offset: i64) -> Result<Self> {
        if limit < 0 || offset < 0 {
            return Err(BookingError::InvalidInput(
                "limit and offset must not be negative".to_string(),
            ));
        }
        Ok(Self { limit, offset })
    }

    /// First page of the given size.
    #[must_use]
    pub const fn first(limit: i64) -> Self {
        Self {
            limit: if limit < 0 { 0 } else { limit },
            offset: 0,
        }
    }

    /// Maximum number of rows.
    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.limit
    }

    /// Rows to skip.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        self.offset
    }
}
