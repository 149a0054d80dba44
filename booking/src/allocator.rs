//! Timeslot Allocator.
//!
//! Validates that the requested timeslots form one gapless chain at one
//! venue on one day that covers the event window, then claims them for an
//! event inside the caller's transaction. The caller commits only after the
//! event row itself is written.

use venue_booking_core::store::StoreTransaction;
use venue_booking_core::types::{
    EventId, EventWindow, MAX_TIMESLOTS_PER_EVENT, Timeslot, TimeslotId, VenueId,
};
use venue_booking_core::{BookingError, ConflictReason, Result};

/// Timeslots claimed for an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Allocation {
    /// Venue shared by every claimed slot.
    pub venue_id: VenueId,
    /// Claimed slots in chronological order.
    pub timeslots: Vec<Timeslot>,
}

impl Allocation {
    /// IDs of the claimed slots in chronological order.
    #[must_use]
    pub fn timeslot_ids(&self) -> Vec<TimeslotId> {
        self.timeslots.iter().map(|slot| slot.id).collect()
    }
}

fn invalid(message: &str) -> BookingError {
    tracing::debug!(reason = message, "Rejected timeslot set");
    BookingError::InvalidInput(message.to_string())
}

/// Check that `slots` can host an event over `window`.
///
/// Sorts the slots by start and requires:
/// - every slot at the same venue
/// - the first start and the last end on the same UTC calendar day
/// - each slot ending one second before the next one starts
/// - `window` inside `[first.start, last.end + 1s)`
///
/// # Errors
///
/// Returns [`BookingError::InvalidInput`] if `slots` is empty or any rule fails.
pub fn validate_chain(mut slots: Vec<Timeslot>, window: EventWindow) -> Result<Allocation> {
    slots.sort_by_key(|slot| slot.start_at);

    let (Some(first), Some(last)) = (slots.first(), slots.last()) else {
        return Err(invalid("at least one timeslot is required"));
    };
    let venue_id = first.venue_id;

    if slots.iter().any(|slot| slot.venue_id != venue_id) {
        return Err(invalid("timeslots must belong to the same venue"));
    }
    if first.start_at.date_naive() != last.end_at.date_naive() {
        return Err(invalid("timeslots must fall on the same day"));
    }
    if !slots.windows(2).all(|pair| pair[0].is_followed_by(&pair[1])) {
        return Err(invalid("timeslots must be contiguous"));
    }
    if window.start() < first.start_at || window.end() > last.covered_until() {
        return Err(invalid("event window exceeds the timeslots"));
    }

    Ok(Allocation { venue_id, timeslots: slots })
}

/// Lock, validate and claim `ids` for `event_id`.
///
/// Slots bound to `excluding` are released before the claim pass, so an
/// event being updated can re-claim the same, fewer or different slots.
/// Any error leaves partial effects in `tx`; the caller must roll back.
///
/// # Errors
///
/// - Zero, duplicate or more than [`MAX_TIMESLOTS_PER_EVENT`] ids → `InvalidInput`
/// - Unknown id → `NotFound`
/// - Chain rules violated → `InvalidInput` (see [`validate_chain`])
/// - A slot already bound to another event → `Conflict(TimeslotTaken)`
pub async fn allocate<T: StoreTransaction>(
    tx: &mut T,
    ids: &[TimeslotId],
    window: EventWindow,
    event_id: EventId,
    excluding: Option<EventId>,
) -> Result<Allocation> {
    if ids.is_empty() || ids.len() > MAX_TIMESLOTS_PER_EVENT {
        return Err(invalid("an event needs one or two timeslots"));
    }

    let mut ordered = ids.to_vec();
    ordered.sort_unstable();
    ordered.dedup();
    if ordered.len() != ids.len() {
        return Err(invalid("timeslot ids must be distinct"));
    }

    // The slots about to be released are locked in the same pass as the
    // requested ones, so no lock is taken out of id order later.
    let locked = tx.lock_timeslots(&ordered, excluding).await?;
    let mut slots = Vec::with_capacity(ordered.len());
    for id in &ordered {
        let slot = locked
            .iter()
            .find(|slot| slot.id == *id)
            .cloned()
            .ok_or(BookingError::not_found("timeslot"))?;
        slots.push(slot);
    }

    let allocation = validate_chain(slots, window)?;

    if let Some(previous) = excluding {
        let released = tx.release_timeslots(previous).await?;
        tracing::debug!(event_id = %previous, released, "Released timeslots");
    }

    for slot in &allocation.timeslots {
        if !tx.claim_timeslot(slot.id, event_id).await? {
            tracing::warn!(
                event_id = %event_id,
                timeslot_id = %slot.id,
                "Timeslot claim lost"
            );
            return Err(BookingError::Conflict(ConflictReason::TimeslotTaken));
        }
    }

    Ok(allocation)
}
