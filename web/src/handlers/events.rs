//! Event endpoints.
//!
//! - GET /api/events - Upcoming events, optionally of one artist (public)
//! - POST /api/events - Publish an event on one or two contiguous timeslots
//! - GET /api/events/:event_id - Event with bindings and seat occupancy (public)
//! - PUT /api/events/:event_id - Replace an event's fields and timeslots

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;
use venue_booking_auth::RevocationList;
use venue_booking_core::CapabilityStore;
use venue_booking_core::types::{Event, EventDraft, EventId, EventSummary, Page, UserId};

use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::handlers::PageQuery;
use crate::state::AppState;

/// `?user_id=&limit=&offset=` on the event listing.
#[derive(Debug, Default, Deserialize)]
pub struct EventListQuery {
    /// Only events of this artist.
    pub user_id: Option<UserId>,
    /// Maximum number of rows.
    pub limit: Option<i64>,
    /// Rows to skip.
    pub offset: Option<i64>,
}

/// List upcoming events.
///
/// # Errors
///
/// 400 on a malformed query.
pub async fn list_events<S, R>(
    State(state): State<AppState<S, R>>,
    query: Result<Query<EventListQuery>, QueryRejection>,
) -> Result<Json<Vec<EventSummary>>, AppError>
where
    S: CapabilityStore + Clone + 'static,
    R: RevocationList + Clone + 'static,
{
    let Query(query) = query?;
    let page = PageQuery {
        limit: query.limit,
        offset: query.offset,
    }
    .into_page(Page::EVENTS_LIMIT)?;
    let events = state.bookings.list_events(query.user_id, page).await?;
    Ok(Json(events))
}

/// Publish an event.
///
/// # Errors
///
/// 400 on an invalid draft or timeslot set, 403 unless artist, 404 on an
/// unknown genre or timeslot, 409 if a slot is taken.
pub async fn create_event<S, R>(
    State(state): State<AppState<S, R>>,
    CurrentUser(identity): CurrentUser,
    body: Result<Json<EventDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Event>), AppError>
where
    S: CapabilityStore + Clone + 'static,
    R: RevocationList + Clone + 'static,
{
    let Json(draft) = body?;
    let event = state.bookings.create_event(&identity, draft).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Get an event.
///
/// # Errors
///
/// 404 if the event does not exist.
pub async fn get_event<S, R>(
    State(state): State<AppState<S, R>>,
    path: Result<Path<EventId>, PathRejection>,
) -> Result<Json<EventSummary>, AppError>
where
    S: CapabilityStore + Clone + 'static,
    R: RevocationList + Clone + 'static,
{
    let Path(event_id) = path?;
    let summary = state.bookings.get_event(event_id).await?;
    Ok(Json(summary))
}

/// Update an event owned by the caller.
///
/// # Errors
///
/// As [`create_event`], plus 403 for someone else's event.
pub async fn update_event<S, R>(
    State(state): State<AppState<S, R>>,
    CurrentUser(identity): CurrentUser,
    path: Result<Path<EventId>, PathRejection>,
    body: Result<Json<EventDraft>, JsonRejection>,
) -> Result<Json<Event>, AppError>
where
    S: CapabilityStore + Clone + 'static,
    R: RevocationList + Clone + 'static,
{
    let Path(event_id) = path?;
    let Json(draft) = body?;
    let event = state
        .bookings
        .update_event(&identity, event_id, draft)
        .await?;
    Ok(Json(event))
}
