//! Row shapes read back from `PostgreSQL` and their domain conversions.

use chrono::{DateTime, Utc};
use uuid::Uuid;
use venue_booking_core::StoreError;
use venue_booking_core::types::{
    Event, EventId, Genre, GenreId, Reservation, ReservationId, Timeslot, TimeslotId, User,
    UserId, Venue, VenueId,
};

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    username: String,
    role: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse()
            .map_err(|_| StoreError::Database(format!("Unknown role in users table: {}", row.role)))?;
        Ok(Self {
            id: UserId::from_uuid(row.id),
            username: row.username,
            role,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct VenueRow {
    id: Uuid,
    name: String,
    capacity: i64,
}

impl From<VenueRow> for Venue {
    fn from(row: VenueRow) -> Self {
        Self {
            id: VenueId::from_uuid(row.id),
            name: row.name,
            capacity: row.capacity,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct GenreRow {
    id: Uuid,
    name: String,
}

impl From<GenreRow> for Genre {
    fn from(row: GenreRow) -> Self {
        Self {
            id: GenreId::from_uuid(row.id),
            name: row.name,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct TimeslotRow {
    id: Uuid,
    venue_id: Uuid,
    event_id: Option<Uuid>,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
}

impl From<TimeslotRow> for Timeslot {
    fn from(row: TimeslotRow) -> Self {
        Self {
            id: TimeslotId::from_uuid(row.id),
            venue_id: VenueId::from_uuid(row.venue_id),
            event_id: row.event_id.map(EventId::from_uuid),
            start_at: row.start_at,
            end_at: row.end_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct EventRow {
    pub(crate) id: Uuid,
    artist_id: Uuid,
    venue_id: Uuid,
    genre_id: Uuid,
    name: String,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    price: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: EventId::from_uuid(row.id),
            artist_id: UserId::from_uuid(row.artist_id),
            venue_id: VenueId::from_uuid(row.venue_id),
            genre_id: GenreId::from_uuid(row.genre_id),
            name: row.name,
            start_at: row.start_at,
            end_at: row.end_at,
            price: row.price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Event joined with its venue capacity and seat total.
#[derive(sqlx::FromRow)]
pub(crate) struct EventSummaryRow {
    #[sqlx(flatten)]
    pub(crate) event: EventRow,
    pub(crate) capacity: i64,
    pub(crate) reserved_seats: i64,
}

#[derive(sqlx::FromRow)]
pub(crate) struct ReservationRow {
    id: Uuid,
    user_id: Uuid,
    event_id: Uuid,
    seat_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        Self {
            id: ReservationId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            event_id: EventId::from_uuid(row.event_id),
            seat_count: row.seat_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Map a driver error, keeping the constraint name of unique violations.
pub(crate) fn store_error(context: &str, e: &sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = e {
        if db_err.is_unique_violation() {
            return StoreError::UniqueViolation(
                db_err.constraint().unwrap_or("unique").to_string(),
            );
        }
    }
    StoreError::Database(format!("Failed to {context}: {e}"))
}
