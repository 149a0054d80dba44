//! Router configuration.

use axum::{
    Router,
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;
use venue_booking_auth::RevocationList;
use venue_booking_core::CapabilityStore;

use crate::handlers::{accounts, events, health::health_check, reservations, timeslots};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// `/health` is unauthenticated; everything else lives under `/api`.
pub fn build_router<S, R>(state: AppState<S, R>) -> Router
where
    S: CapabilityStore + Clone + 'static,
    R: RevocationList + Clone + 'static,
{
    let api_routes = Router::new()
        // Accounts
        .route("/login", post(accounts::login::<S, R>))
        .route("/logout", post(accounts::logout::<S, R>))
        .route("/users", post(accounts::sign_up::<S, R>))
        .route("/users/:user_id", get(accounts::get_user::<S, R>))
        .route(
            "/users/:user_id/reservations",
            get(reservations::list_user_reservations::<S, R>),
        )
        // Venues
        .route(
            "/venues/:venue_id/timeslots",
            get(timeslots::list_free_timeslots::<S, R>),
        )
        // Events
        .route(
            "/events",
            get(events::list_events::<S, R>).post(events::create_event::<S, R>),
        )
        .route(
            "/events/:event_id",
            get(events::get_event::<S, R>).put(events::update_event::<S, R>),
        )
        .route(
            "/events/:event_id/reservations",
            get(reservations::list_event_reservations::<S, R>)
                .post(reservations::create_reservation::<S, R>),
        )
        // Reservations
        .route(
            "/reservations/:reservation_id",
            get(reservations::get_reservation::<S, R>)
                .delete(reservations::cancel_reservation::<S, R>),
        );

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
}

/// Router serving the Prometheus scrape endpoint at `/metrics`.
pub fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new().route(
        "/metrics",
        get(move || std::future::ready(handle.render())),
    )
}
