//! Reservation Arbiter.
//!
//! Admission is an indivisible check-then-act under the event's admission
//! lock: no existing reservation for the user, requested seats fit in the
//! remaining capacity, insert. Remaining capacity is always recomputed by
//! summing reservations, never stored as a counter.

use chrono::{DateTime, Utc};
use venue_booking_core::store::{CapabilityStore, StoreTransaction};
use venue_booking_core::types::{EventId, Reservation, ReservationId, UserId};
use venue_booking_core::{BookingError, ConflictReason, Result};

/// Admit a reservation inside `tx`. The caller commits.
///
/// # Errors
///
/// - Non-positive `seat_count` → `InvalidInput`
/// - Unknown event → `NotFound`
/// - User already holds a reservation for the event → `Conflict(AlreadyReserved)`
/// - Not enough seats left → `Conflict(SoldOut)`
pub async fn admit<T: StoreTransaction>(
    tx: &mut T,
    event_id: EventId,
    user_id: UserId,
    seat_count: i64,
    now: DateTime<Utc>,
) -> Result<Reservation> {
    if seat_count <= 0 {
        return Err(BookingError::InvalidInput(
            "seat count must be positive".to_string(),
        ));
    }

    let capacity = tx
        .lock_event_for_admission(event_id)
        .await?
        .ok_or(BookingError::not_found("event"))?;

    if tx.find_reservation_for(event_id, user_id).await?.is_some() {
        tracing::warn!(event_id = %event_id, user_id = %user_id, "Duplicate reservation rejected");
        return Err(BookingError::Conflict(ConflictReason::AlreadyReserved));
    }

    let reserved = tx.reserved_seats(event_id).await?;
    let fits = reserved
        .checked_add(seat_count)
        .is_some_and(|total| total <= capacity);
    if !fits {
        tracing::warn!(
            event_id = %event_id,
            requested = seat_count,
            reserved,
            capacity,
            "Reservation exceeds capacity"
        );
        return Err(BookingError::Conflict(ConflictReason::SoldOut));
    }

    let reservation = Reservation {
        id: ReservationId::new(),
        user_id,
        event_id,
        seat_count,
        created_at: now,
        updated_at: now,
    };
    tx.insert_reservation(&reservation).await?;
    Ok(reservation)
}

/// Admit and commit a reservation in its own transaction.
///
/// Every failure rolls the transaction back.
///
/// # Errors
///
/// See [`admit`]; store failures surface as `Internal`.
pub async fn reserve<S: CapabilityStore>(
    store: &S,
    event_id: EventId,
    user_id: UserId,
    seat_count: i64,
    now: DateTime<Utc>,
) -> Result<Reservation> {
    let mut tx = store.begin().await?;
    let admitted = admit(&mut tx, event_id, user_id, seat_count, now).await;

    match admitted {
        Ok(reservation) => {
            tx.commit().await?;
            tracing::info!(
                reservation_id = %reservation.id,
                event_id = %event_id,
                seats = seat_count,
                "Reservation created"
            );
            Ok(reservation)
        },
        Err(e) => {
            let _ = tx.rollback().await;
            Err(e)
        },
    }
}

/// Delete a reservation. Freed seats become available immediately.
///
/// # Errors
///
/// Returns `NotFound` if the reservation no longer exists.
pub async fn cancel<S: CapabilityStore>(store: &S, reservation_id: ReservationId) -> Result<()> {
    if !store.delete_reservation(reservation_id).await? {
        return Err(BookingError::not_found("reservation"));
    }
    tracing::info!(reservation_id = %reservation_id, "Reservation cancelled");
    Ok(())
}
