//! `PostgreSQL` Capability Store.

use crate::rows::{
    EventRow, EventSummaryRow, GenreRow, ReservationRow, TimeslotRow, UserRow, VenueRow,
    store_error,
};
use crate::transaction::PostgresTransaction;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use venue_booking_core::store::{CapabilityStore, StoreResult};
use venue_booking_core::types::{
    Event, EventId, EventSummary, Genre, GenreId, Page, Reservation, ReservationId,
    ReservationScope, Timeslot, TimeslotId, User, UserId, Venue, VenueId,
};
use venue_booking_core::StoreError;

const SUMMARY_SELECT: &str = r"
    SELECT e.id, e.artist_id, e.venue_id, e.genre_id, e.name, e.start_at, e.end_at,
           e.price, e.created_at, e.updated_at,
           v.capacity,
           COALESCE(
               (SELECT SUM(r.seat_count) FROM reservations r WHERE r.event_id = e.id),
               0
           )::BIGINT AS reserved_seats
    FROM events e
    JOIN venues v ON v.id = e.venue_id
";

/// Capability Store backed by a `PostgreSQL` connection pool.
///
/// Slot exclusivity and capacity are enforced with row locks
/// (`SELECT ... FOR UPDATE`) and conditional updates inside
/// [`PostgresTransaction`]s. Uniqueness of usernames and of one reservation
/// per user and event is additionally backed by table constraints.
#[derive(Clone, Debug)]
pub struct PostgresCapabilityStore {
    pool: PgPool,
}

impl PostgresCapabilityStore {
    /// Create a store from an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns error if a migration fails to apply.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;

        tracing::info!("Booking schema migrations applied");
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Provisioning
    //
    // Venues, genres and timeslots are administered outside the booking
    // engine; these writes exist to load them.
    // ═══════════════════════════════════════════════════════════════════════

    /// Insert a venue.
    ///
    /// # Errors
    ///
    /// Returns error if the statement fails.
    pub async fn insert_venue(&self, venue: &Venue) -> StoreResult<()> {
        sqlx::query("INSERT INTO venues (id, name, capacity) VALUES ($1, $2, $3)")
            .bind(venue.id.as_uuid())
            .bind(&venue.name)
            .bind(venue.capacity)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("insert venue", &e))?;
        Ok(())
    }

    /// Insert a genre.
    ///
    /// # Errors
    ///
    /// Returns error if the statement fails.
    pub async fn insert_genre(&self, genre: &Genre) -> StoreResult<()> {
        sqlx::query("INSERT INTO genres (id, name) VALUES ($1, $2)")
            .bind(genre.id.as_uuid())
            .bind(&genre.name)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("insert genre", &e))?;
        Ok(())
    }

    /// Insert an unbound timeslot.
    ///
    /// # Errors
    ///
    /// Returns error if the statement fails.
    pub async fn insert_timeslot(&self, timeslot: &Timeslot) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO timeslots (id, venue_id, event_id, start_at, end_at)
            VALUES ($1, $2, NULL, $3, $4)
            ",
        )
        .bind(timeslot.id.as_uuid())
        .bind(timeslot.venue_id.as_uuid())
        .bind(timeslot.start_at)
        .bind(timeslot.end_at)
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("insert timeslot", &e))?;
        Ok(())
    }

    /// Get a timeslot without locking it.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn timeslot(&self, id: TimeslotId) -> StoreResult<Option<Timeslot>> {
        let row: Option<TimeslotRow> = sqlx::query_as(
            "SELECT id, venue_id, event_id, start_at, end_at FROM timeslots WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("load timeslot", &e))?;
        Ok(row.map(Timeslot::from))
    }

    async fn summary(&self, row: EventSummaryRow) -> StoreResult<EventSummary> {
        let timeslot_ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM timeslots WHERE event_id = $1 ORDER BY start_at")
                .bind(row.event.id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| store_error("load event timeslots", &e))?;

        Ok(EventSummary {
            event: Event::from(row.event),
            timeslot_ids: timeslot_ids.into_iter().map(TimeslotId::from_uuid).collect(),
            capacity: row.capacity,
            reserved_seats: row.reserved_seats,
        })
    }
}

impl CapabilityStore for PostgresCapabilityStore {
    type Tx = PostgresTransaction;

    async fn begin(&self) -> StoreResult<PostgresTransaction> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("begin transaction", &e))?;
        Ok(PostgresTransaction::new(tx))
    }

    async fn user(&self, id: UserId) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r"
            SELECT id, username, role, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("load user", &e))?;
        row.map(User::try_from).transpose()
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r"
            SELECT id, username, role, password_hash, created_at, updated_at
            FROM users
            WHERE username = $1
            ",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("load user by username", &e))?;
        row.map(User::try_from).transpose()
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO users (id, username, role, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let err = store_error("insert user", &e);
            if matches!(err, StoreError::UniqueViolation(_)) {
                tracing::debug!(username = %user.username, "Username already registered");
            }
            err
        })?;
        Ok(())
    }

    async fn venue(&self, id: VenueId) -> StoreResult<Option<Venue>> {
        let row: Option<VenueRow> =
            sqlx::query_as("SELECT id, name, capacity FROM venues WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| store_error("load venue", &e))?;
        Ok(row.map(Venue::from))
    }

    async fn free_timeslots(
        &self,
        venue_id: VenueId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Timeslot>> {
        let rows: Vec<TimeslotRow> = sqlx::query_as(
            r"
            SELECT id, venue_id, event_id, start_at, end_at
            FROM timeslots
            WHERE venue_id = $1 AND event_id IS NULL AND start_at BETWEEN $2 AND $3
            ORDER BY start_at, id
            ",
        )
        .bind(venue_id.as_uuid())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("list free timeslots", &e))?;
        Ok(rows.into_iter().map(Timeslot::from).collect())
    }

    async fn event(&self, id: EventId) -> StoreResult<Option<Event>> {
        let row: Option<EventRow> = sqlx::query_as(
            r"
            SELECT id, artist_id, venue_id, genre_id, name, start_at, end_at, price,
                   created_at, updated_at
            FROM events
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("load event", &e))?;
        Ok(row.map(Event::from))
    }

    async fn event_summary(&self, id: EventId) -> StoreResult<Option<EventSummary>> {
        let sql = format!("{SUMMARY_SELECT} WHERE e.id = $1");
        let row: Option<EventSummaryRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("load event summary", &e))?;

        match row {
            Some(row) => Ok(Some(self.summary(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_events(
        &self,
        artist_id: Option<UserId>,
        from: DateTime<Utc>,
        page: Page,
    ) -> StoreResult<Vec<EventSummary>> {
        let sql = format!(
            r"
            {SUMMARY_SELECT}
            WHERE e.start_at >= $1 AND ($2::UUID IS NULL OR e.artist_id = $2)
            ORDER BY e.start_at, e.id
            LIMIT $3 OFFSET $4
            "
        );
        let rows: Vec<EventSummaryRow> = sqlx::query_as(&sql)
            .bind(from)
            .bind(artist_id.map(|id| *id.as_uuid()))
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("list events", &e))?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            summaries.push(self.summary(row).await?);
        }
        Ok(summaries)
    }

    async fn genre(&self, id: GenreId) -> StoreResult<Option<Genre>> {
        let row: Option<GenreRow> = sqlx::query_as("SELECT id, name FROM genres WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("load genre", &e))?;
        Ok(row.map(Genre::from))
    }

    async fn reservation(&self, id: ReservationId) -> StoreResult<Option<Reservation>> {
        let row: Option<ReservationRow> = sqlx::query_as(
            r"
            SELECT id, user_id, event_id, seat_count, created_at, updated_at
            FROM reservations
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("load reservation", &e))?;
        Ok(row.map(Reservation::from))
    }

    async fn list_reservations(
        &self,
        scope: ReservationScope,
        page: Page,
    ) -> StoreResult<Vec<Reservation>> {
        let (sql, key) = match scope {
            ReservationScope::ByUser(user_id) => (
                r"
                SELECT id, user_id, event_id, seat_count, created_at, updated_at
                FROM reservations
                WHERE user_id = $1
                ORDER BY created_at, id
                LIMIT $2 OFFSET $3
                ",
                *user_id.as_uuid(),
            ),
            ReservationScope::ByEvent(event_id) => (
                r"
                SELECT id, user_id, event_id, seat_count, created_at, updated_at
                FROM reservations
                WHERE event_id = $1
                ORDER BY created_at, id
                LIMIT $2 OFFSET $3
                ",
                *event_id.as_uuid(),
            ),
        };

        let rows: Vec<ReservationRow> = sqlx::query_as(sql)
            .bind(key)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("list reservations", &e))?;
        Ok(rows.into_iter().map(Reservation::from).collect())
    }

    async fn delete_reservation(&self, id: ReservationId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("delete reservation", &e))?;
        Ok(result.rows_affected() == 1)
    }
}
