//! Reservation endpoints.
//!
//! - POST /api/events/:event_id/reservations - Reserve seats
//! - GET /api/events/:event_id/reservations - Reservations for an artist's event
//! - GET /api/users/:user_id/reservations - Reservations held by a user
//! - GET /api/reservations/:reservation_id - Read one reservation
//! - DELETE /api/reservations/:reservation_id - Cancel a reservation

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
use venue_booking_core::types::{
    EventId, Page, Reservation, ReservationId, ReservationScope, UserId,
};

use super::{PageQuery, page_query};
use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::state::AppState;

/// Request to reserve seats.
#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    /// Number of seats, at least one
    pub seat_count: i64,
}

/// Reserve seats for an event.
///
/// # Errors
///
/// 400 on a non-positive seat count, 403 unless audience, 404 on an unknown
/// event, 409 if already reserved or sold out.
pub async fn create_reservation<S, R>(
    State(state): State<AppState<S, R>>,
    CurrentUser(identity): CurrentUser,
    path: Result<Path<EventId>, PathRejection>,
    body: Result<Json<CreateReservationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Reservation>), AppError>
where
    S: CapabilityStore + Clone + 'static,
    R: RevocationList + Clone + 'static,
{
    let Path(event_id) = path?;
    let Json(request) = body?;
    let reservation = state
        .bookings
        .create_reservation(&identity, event_id, request.seat_count)
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Read a reservation.
///
/// # Errors
///
/// 401, 403 (not the holder), 404.
pub async fn get_reservation<S, R>(
    State(state): State<AppState<S, R>>,
    CurrentUser(identity): CurrentUser,
    path: Result<Path<ReservationId>, PathRejection>,
) -> Result<Json<Reservation>, AppError>
where
    S: CapabilityStore + Clone + 'static,
    R: RevocationList + Clone + 'static,
{
    let Path(reservation_id) = path?;
    let reservation = state
        .bookings
        .get_reservation(&identity, reservation_id)
        .await?;
    Ok(Json(reservation))
}

/// Cancel a reservation.
///
/// # Errors
///
/// 401, 403 (not the holder), 404.
pub async fn cancel_reservation<S, R>(
    State(state): State<AppState<S, R>>,
    CurrentUser(identity): CurrentUser,
    path: Result<Path<ReservationId>, PathRejection>,
) -> Result<StatusCode, AppError>
where
    S: CapabilityStore + Clone + 'static,
    R: RevocationList + Clone + 'static,
{
    let Path(reservation_id) = path?;
    state
        .bookings
        .cancel_reservation(&identity, reservation_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List a user's reservations, five per page by default.
///
/// # Errors
///
/// 400 on negative paging, 401, 403 (someone else's listing), 404.
pub async fn list_user_reservations<S, R>(
    State(state): State<AppState<S, R>>,
    CurrentUser(identity): CurrentUser,
    path: Result<Path<UserId>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Vec<Reservation>>, AppError>
where
    S: CapabilityStore + Clone + 'static,
    R: RevocationList + Clone + 'static,
{
    let Path(user_id) = path?;
    let page = page_query(query, Page::USER_RESERVATIONS_LIMIT)?;
    let reservations = state
        .bookings
        .list_reservations(&identity, ReservationScope::ByUser(user_id), page)
        .await?;
    Ok(Json(reservations))
}

/// List an event's reservations, ten per page by default.
///
/// # Errors
///
/// 400 on negative paging, 401, 403 (not the event's artist), 404.
pub async fn list_event_reservations<S, R>(
    State(state): State<AppState<S, R>>,
    CurrentUser(identity): CurrentUser,
    path: Result<Path<EventId>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Vec<Reservation>>, AppError>
where
    S: CapabilityStore + Clone + 'static,
    R: RevocationList + Clone + 'static,
{
    let Path(event_id) = path?;
    let page = page_query(query, Page::EVENT_RESERVATIONS_LIMIT)?;
    let reservations = state
        .bookings
        .list_reservations(&identity, ReservationScope::ByEvent(event_id), page)
        .await?;
    Ok(Json(reservations))
}
