//! Role-based authorization policy.
//!
//! A closed table mapping `(operation, role, ownership)` to a decision.
//! Callers establish ownership from the stored resource, then call
//! [`authorize`] before doing any mutating work.

use crate::error::{BookingError, Result};
use crate::types::Role;

/// Operation subject to authorization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Publish a new event.
    CreateEvent,
    /// Modify an existing event.
    UpdateEvent,
    /// Reserve seats for an event.
    CreateReservation,
    /// Read a single reservation.
    ReadReservation,
    /// Delete a reservation.
    CancelReservation,
    /// List the reservations a user holds.
    ListUserReservations,
    /// List the reservations made for an event.
    ListEventReservations,
    /// Read a user's profile.
    ReadUser,
    /// List the free timeslots of a venue.
    ListTimeslots,
}

impl Operation {
    /// All operations, for exhaustive checks.
    pub const ALL: [Self; 9] = [
        Self::CreateEvent,
        Self::UpdateEvent,
        Self::CreateReservation,
        Self::ReadReservation,
        Self::CancelReservation,
        Self::ListUserReservations,
        Self::ListEventReservations,
        Self::ReadUser,
        Self::ListTimeslots,
    ];
}

/// Relation between the caller and the targeted resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// The caller owns the resource (or is the user being read).
    Owned,
    /// The resource belongs to someone else.
    NotOwned,
    /// The operation targets no pre-existing resource.
    NotApplicable,
}

impl Ownership {
    /// `Owned` when `is_owner` holds, `NotOwned` otherwise.
    #[must_use]
    pub const fn from_match(is_owner: bool) -> Self {
        if is_owner { Self::Owned } else { Self::NotOwned }
    }
}

/// Outcome of a policy lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// The operation may proceed.
    Allow,
    /// The operation must be refused.
    Deny,
}

/// Look up the policy table.
#[must_use]
pub const fn decide(operation: Operation, role: Role, ownership: Ownership) -> Decision {
    use Operation as Op;

    let allowed = match (operation, role) {
        (Op::CreateEvent | Op::ListTimeslots, Role::Artist)
        | (Op::CreateReservation, Role::Audience) => true,
        (Op::CreateEvent | Op::CreateReservation, _) => false,

        // Owners bypass ownership checks everywhere else.
        (_, Role::Owner) => true,

        (Op::UpdateEvent | Op::ListEventReservations, Role::Artist)
        | (
            Op::ReadReservation | Op::CancelReservation | Op::ListUserReservations,
            Role::Audience,
        )
        | (Op::ReadUser, Role::Audience | Role::Artist) => {
            matches!(ownership, Ownership::Owned)
        },

        _ => false,
    };

    if allowed { Decision::Allow } else { Decision::Deny }
}

/// Look up the policy table, turning `Deny` into [`BookingError::Forbidden`].
///
/// # Errors
///
/// Returns [`BookingError::Forbidden`] if the table denies the operation.
pub fn authorize(operation: Operation, role: Role, ownership: Ownership) -> Result<()> {
    match decide(operation, role, ownership) {
        Decision::Allow => Ok(()),
        Decision::Deny => Err(BookingError::Forbidden),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLES: [Role; 3] = [Role::Audience, Role::Artist, Role::Owner];
    const OWNERSHIPS: [Ownership; 3] =
        [Ownership::Owned, Ownership::NotOwned, Ownership::NotApplicable];

    fn allowed(operation: Operation, role: Role, ownership: Ownership) -> bool {
        decide(operation, role, ownership) == Decision::Allow
    }

    #[test]
    fn test_only_artists_create_events() {
        for role in ROLES {
            assert_eq!(
                allowed(Operation::CreateEvent, role, Ownership::NotApplicable),
                role == Role::Artist
            );
        }
    }

    #[test]
    fn test_only_audience_creates_reservations() {
        for role in ROLES {
            assert_eq!(
                allowed(Operation::CreateReservation, role, Ownership::NotApplicable),
                role == Role::Audience
            );
        }
    }

    #[test]
    fn test_event_update_requires_owning_artist_or_owner() {
        assert!(allowed(Operation::UpdateEvent, Role::Artist, Ownership::Owned));
        assert!(!allowed(Operation::UpdateEvent, Role::Artist, Ownership::NotOwned));
        assert!(allowed(Operation::UpdateEvent, Role::Owner, Ownership::NotOwned));
        assert!(!allowed(Operation::UpdateEvent, Role::Audience, Ownership::Owned));
    }

    #[test]
    fn test_reservation_access_requires_holder_or_owner() {
        for op in [
            Operation::ReadReservation,
            Operation::CancelReservation,
            Operation::ListUserReservations,
        ] {
            assert!(allowed(op, Role::Audience, Ownership::Owned));
            assert!(!allowed(op, Role::Audience, Ownership::NotOwned));
            assert!(!allowed(op, Role::Artist, Ownership::Owned));
            assert!(allowed(op, Role::Owner, Ownership::NotOwned));
        }
    }

    #[test]
    fn test_event_listing_requires_owning_artist_or_owner() {
        assert!(allowed(Operation::ListEventReservations, Role::Artist, Ownership::Owned));
        assert!(!allowed(Operation::ListEventReservations, Role::Artist, Ownership::NotOwned));
        assert!(!allowed(Operation::ListEventReservations, Role::Audience, Ownership::Owned));
        assert!(allowed(Operation::ListEventReservations, Role::Owner, Ownership::NotOwned));
    }

    #[test]
    fn test_timeslot_listing_is_artist_or_owner() {
        assert!(allowed(Operation::ListTimeslots, Role::Artist, Ownership::NotApplicable));
        assert!(allowed(Operation::ListTimeslots, Role::Owner, Ownership::NotApplicable));
        assert!(!allowed(Operation::ListTimeslots, Role::Audience, Ownership::NotApplicable));
    }

    #[test]
    fn test_user_read_is_self_or_owner() {
        assert!(allowed(Operation::ReadUser, Role::Audience, Ownership::Owned));
        assert!(allowed(Operation::ReadUser, Role::Artist, Ownership::Owned));
        assert!(!allowed(Operation::ReadUser, Role::Artist, Ownership::NotOwned));
        assert!(allowed(Operation::ReadUser, Role::Owner, Ownership::NotOwned));
    }

    #[test]
    fn test_not_owned_never_allowed_without_owner_role() {
        for op in Operation::ALL {
            for role in [Role::Audience, Role::Artist] {
                if !matches!(
                    op,
                    Operation::CreateEvent | Operation::CreateReservation | Operation::ListTimeslots
                ) {
                    assert!(!allowed(op, role, Ownership::NotOwned), "{op:?} {role:?}");
                }
            }
        }
    }

    #[test]
    fn test_authorize_maps_deny_to_forbidden() {
        assert_eq!(
            authorize(Operation::CreateEvent, Role::Owner, Ownership::NotApplicable),
            Err(BookingError::Forbidden)
        );
        for ownership in OWNERSHIPS {
            assert!(authorize(Operation::ReadUser, Role::Owner, ownership).is_ok());
        }
    }
}
