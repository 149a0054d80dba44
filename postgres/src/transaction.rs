//! Row-locking transaction over a pooled `PostgreSQL` connection.

use crate::rows::{EventRow, ReservationRow, TimeslotRow, store_error};
use sqlx::{Postgres, Transaction};
use venue_booking_core::store::{StoreResult, StoreTransaction};
use uuid::Uuid;
use venue_booking_core::types::{Event, EventId, Reservation, Timeslot, TimeslotId, UserId};

/// An open `PostgreSQL` transaction.
///
/// Locks taken with `FOR UPDATE` are held until [`commit`] or [`rollback`].
/// Dropping the handle without committing rolls the transaction back.
///
/// [`commit`]: StoreTransaction::commit
/// [`rollback`]: StoreTransaction::rollback
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

impl std::fmt::Debug for PostgresTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresTransaction").finish_non_exhaustive()
    }
}

impl PostgresTransaction {
    pub(crate) const fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

impl StoreTransaction for PostgresTransaction {
    async fn lock_timeslots(
        &mut self,
        ids: &[TimeslotId],
        bound_to: Option<EventId>,
    ) -> StoreResult<Vec<Timeslot>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        // Rows are locked as they come out of the sort, so the order is by id.
        let rows: Vec<TimeslotRow> = sqlx::query_as(
            r"
            SELECT id, venue_id, event_id, start_at, end_at
            FROM timeslots
            WHERE id = ANY($1) OR event_id = $2
            ORDER BY id
            FOR UPDATE
            ",
        )
        .bind(ids)
        .bind(bound_to.map(|id| *id.as_uuid()))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| store_error("lock timeslots", &e))?;
        Ok(rows.into_iter().map(Timeslot::from).collect())
    }

    async fn release_timeslots(&mut self, event_id: EventId) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE timeslots SET event_id = NULL WHERE event_id = $1")
            .bind(event_id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| store_error("release timeslots", &e))?;
        Ok(result.rows_affected())
    }

    async fn claim_timeslot(&mut self, id: TimeslotId, event_id: EventId) -> StoreResult<bool> {
        // Zero rows means another event already holds the slot.
        let result = sqlx::query(
            "UPDATE timeslots SET event_id = $2 WHERE id = $1 AND event_id IS NULL",
        )
        .bind(id.as_uuid())
        .bind(event_id.as_uuid())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| store_error("claim timeslot", &e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn lock_event(&mut self, id: EventId) -> StoreResult<Option<Event>> {
        let row: Option<EventRow> = sqlx::query_as(
            r"
            SELECT id, artist_id, venue_id, genre_id, name, start_at, end_at, price,
                   created_at, updated_at
            FROM events
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| store_error("lock event", &e))?;
        Ok(row.map(Event::from))
    }

    async fn insert_event(&mut self, event: &Event) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO events
                (id, artist_id, venue_id, genre_id, name, start_at, end_at, price,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(event.id.as_uuid())
        .bind(event.artist_id.as_uuid())
        .bind(event.venue_id.as_uuid())
        .bind(event.genre_id.as_uuid())
        .bind(&event.name)
        .bind(event.start_at)
        .bind(event.end_at)
        .bind(event.price)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| store_error("insert event", &e))?;
        Ok(())
    }

    async fn update_event(&mut self, event: &Event) -> StoreResult<()> {
        sqlx::query(
            r"
            UPDATE events
            SET venue_id = $2, genre_id = $3, name = $4, start_at = $5, end_at = $6,
                price = $7, updated_at = $8
            WHERE id = $1
            ",
        )
        .bind(event.id.as_uuid())
        .bind(event.venue_id.as_uuid())
        .bind(event.genre_id.as_uuid())
        .bind(&event.name)
        .bind(event.start_at)
        .bind(event.end_at)
        .bind(event.price)
        .bind(event.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| store_error("update event", &e))?;
        Ok(())
    }

    async fn lock_event_for_admission(&mut self, event_id: EventId) -> StoreResult<Option<i64>> {
        // Locking the event row serializes admission per event; the venue row
        // stays shared so other events at the same venue are unaffected.
        sqlx::query_scalar(
            r"
            SELECT v.capacity
            FROM events e
            JOIN venues v ON v.id = e.venue_id
            WHERE e.id = $1
            FOR UPDATE OF e
            ",
        )
        .bind(event_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| store_error("lock event for admission", &e))
    }

    async fn find_reservation_for(
        &mut self,
        event_id: EventId,
        user_id: UserId,
    ) -> StoreResult<Option<Reservation>> {
        let row: Option<ReservationRow> = sqlx::query_as(
            r"
            SELECT id, user_id, event_id, seat_count, created_at, updated_at
            FROM reservations
            WHERE event_id = $1 AND user_id = $2
            ",
        )
        .bind(event_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| store_error("find reservation", &e))?;
        Ok(row.map(Reservation::from))
    }

    async fn reserved_seats(&mut self, event_id: EventId) -> StoreResult<i64> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(seat_count), 0)::BIGINT FROM reservations WHERE event_id = $1",
        )
        .bind(event_id.as_uuid())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| store_error("sum reserved seats", &e))
    }

    async fn insert_reservation(&mut self, reservation: &Reservation) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO reservations (id, user_id, event_id, seat_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(reservation.id.as_uuid())
        .bind(reservation.user_id.as_uuid())
        .bind(reservation.event_id.as_uuid())
        .bind(reservation.seat_count)
        .bind(reservation.created_at)
        .bind(reservation.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| store_error("insert reservation", &e))?;
        Ok(())
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| store_error("commit transaction", &e))
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| store_error("roll back transaction", &e))
    }
}
