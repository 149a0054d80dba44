//! Timeslot endpoints.
//!
//! - GET /api/venues/:venue_id/timeslots - Free slots of a venue (artist or owner)

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use venue_booking_auth::RevocationList;
use venue_booking_core::CapabilityStore;
use venue_booking_core::types::{Timeslot, VenueId};

use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::state::AppState;

/// `?from=&to=` as RFC 3339 instants.
#[derive(Debug, Default, Deserialize)]
pub struct TimeslotQuery {
    /// Earliest slot start; defaults to now.
    pub from: Option<DateTime<Utc>>,
    /// Latest slot start; defaults to the end of the current month.
    pub to: Option<DateTime<Utc>>,
}

/// List the free timeslots of a venue.
///
/// # Errors
///
/// 400 on a malformed path or query, 403 for audience members, 404 on an
/// unknown venue.
pub async fn list_free_timeslots<S, R>(
    State(state): State<AppState<S, R>>,
    CurrentUser(identity): CurrentUser,
    path: Result<Path<VenueId>, PathRejection>,
    query: Result<Query<TimeslotQuery>, QueryRejection>,
) -> Result<Json<Vec<Timeslot>>, AppError>
where
    S: CapabilityStore + Clone + 'static,
    R: RevocationList + Clone + 'static,
{
    let Path(venue_id) = path?;
    let Query(window) = query?;
    let slots = state
        .bookings
        .list_free_timeslots(&identity, venue_id, window.from, window.to)
        .await?;
    Ok(Json(slots))
}
