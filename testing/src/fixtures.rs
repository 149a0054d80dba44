//! Seed data shared by booking tests.

use chrono::{DateTime, NaiveDate, Utc};
use venue_booking_core::types::{GenreId, Role, TimeslotId, User, VenueId};

use crate::store::InMemoryCapabilityStore;

/// Instant on 2025-06-`day` in UTC.
///
/// # Panics
///
/// Panics if the components do not form a valid date and time.
#[must_use]
#[allow(clippy::expect_used)]
pub fn datetime(day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2025, 6, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .expect("fixture timestamp should be valid")
        .and_utc()
}

/// Instant on the fixture day (2025-06-01) in UTC.
///
/// # Panics
///
/// Panics if the components do not form a valid time.
#[must_use]
pub fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    datetime(1, hour, minute, second)
}

/// A seeded store: one venue with a handful of hourly slots, a genre and
/// one user per role (plus a second artist and audience member).
///
/// | slot          | venue       | interval                       |
/// |---------------|-------------|--------------------------------|
/// | `morning`     | `venue_id`  | 06-01 10:00:00 – 10:59:59      |
/// | `noon`        | `venue_id`  | 06-01 11:00:00 – 11:59:59      |
/// | `afternoon`   | `venue_id`  | 06-01 13:00:00 – 13:59:59      |
/// | `late_night`  | `venue_id`  | 06-01 23:00:00 – 23:59:59      |
/// | `next_day`    | `venue_id`  | 06-02 00:00:00 – 00:59:59      |
/// | `elsewhere`   | `other_venue_id` | 06-01 12:00:00 – 12:59:59 |
#[derive(Debug, Clone)]
pub struct BookingFixture {
    /// The seeded store.
    pub store: InMemoryCapabilityStore,
    /// Main venue.
    pub venue_id: VenueId,
    /// Second venue.
    pub other_venue_id: VenueId,
    /// Genre for every event.
    pub genre_id: GenreId,
    /// 10:00:00 – 10:59:59.
    pub morning: TimeslotId,
    /// 11:00:00 – 11:59:59, follows `morning`.
    pub noon: TimeslotId,
    /// 13:00:00 – 13:59:59, leaves a gap after `noon`.
    pub afternoon: TimeslotId,
    /// 23:00:00 – 23:59:59.
    pub late_night: TimeslotId,
    /// Next day 00:00:00 – 00:59:59, follows `late_night`.
    pub next_day: TimeslotId,
    /// 12:00:00 – 12:59:59 at the other venue, follows `noon` in time.
    pub elsewhere: TimeslotId,
    /// Publishes events.
    pub artist: User,
    /// Another artist.
    pub other_artist: User,
    /// Reserves seats.
    pub audience: User,
    /// Another audience member.
    pub other_audience: User,
    /// Privileged operator.
    pub owner: User,
}

impl BookingFixture {
    /// Seed a fresh store whose main venue holds `capacity` seats.
    pub async fn new(capacity: i64) -> Self {
        let store = InMemoryCapabilityStore::new();
        let venue_id = store.seed_venue("Main Hall", capacity).await;
        let other_venue_id = store.seed_venue("Side Stage", capacity).await;
        let genre_id = store.seed_genre("Rock").await;

        let morning = store.seed_timeslot(venue_id, at(10, 0, 0), at(10, 59, 59)).await;
        let noon = store.seed_timeslot(venue_id, at(11, 0, 0), at(11, 59, 59)).await;
        let afternoon = store.seed_timeslot(venue_id, at(13, 0, 0), at(13, 59, 59)).await;
        let late_night = store.seed_timeslot(venue_id, at(23, 0, 0), at(23, 59, 59)).await;
        let next_day = store
            .seed_timeslot(venue_id, datetime(2, 0, 0, 0), datetime(2, 0, 59, 59))
            .await;
        let elsewhere = store
            .seed_timeslot(other_venue_id, at(12, 0, 0), at(12, 59, 59))
            .await;

        let artist = store.seed_user("artist", Role::Artist).await;
        let other_artist = store.seed_user("other-artist", Role::Artist).await;
        let audience = store.seed_user("audience", Role::Audience).await;
        let other_audience = store.seed_user("other-audience", Role::Audience).await;
        let owner = store.seed_user("owner", Role::Owner).await;

        Self {
            store,
            venue_id,
            other_venue_id,
            genre_id,
            morning,
            noon,
            afternoon,
            late_night,
            next_day,
            elsewhere,
            artist,
            other_artist,
            audience,
            other_audience,
            owner,
        }
    }
}
