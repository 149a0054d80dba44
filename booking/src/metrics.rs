//! Business metrics for the booking engine.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `booking_events_total{operation, outcome}` - Event creations and updates
//! - `booking_reservations_total{operation, outcome}` - Reservation creations and cancellations
//! - `booking_revocations_total` - Credentials added to the revocation list
//!
//! `outcome` is one of `ok`, `conflict`, `invalid`, `not_found`, `forbidden`,
//! `unauthorized` or `error`.

use metrics::describe_counter;
use venue_booking_core::{BookingError, Result};

/// Initialize and register all business metrics descriptions.
///
/// This should be called once at application startup, before any metrics are recorded.
pub fn register_business_metrics() {
    describe_counter!(
        "booking_events_total",
        "Total number of event creations and updates by outcome"
    );
    describe_counter!(
        "booking_reservations_total",
        "Total number of reservation creations and cancellations by outcome"
    );
    describe_counter!(
        "booking_revocations_total",
        "Total number of credentials added to the revocation list"
    );

    tracing::info!("Business metrics registered");
}

/// Label for the outcome of a booking operation.
#[must_use]
pub const fn outcome_label(error: Option<&BookingError>) -> &'static str {
    match error {
        None => "ok",
        Some(BookingError::Conflict(_)) => "conflict",
        Some(BookingError::InvalidInput(_)) => "invalid",
        Some(BookingError::NotFound { .. }) => "not_found",
        Some(BookingError::Forbidden) => "forbidden",
        Some(BookingError::Unauthorized | BookingError::MalformedCredential(_)) => "unauthorized",
        Some(BookingError::Internal(_)) => "error",
    }
}

fn observe<T>(metric: &'static str, operation: &'static str, result: &Result<T>) {
    let error = result.as_ref().err();
    if let Some(BookingError::Internal(detail)) = error {
        tracing::error!(operation, error = %detail, "Booking operation failed");
    }
    metrics::counter!(metric, "operation" => operation, "outcome" => outcome_label(error))
        .increment(1);
}

pub(crate) fn record_event<T>(operation: &'static str, result: &Result<T>) {
    observe("booking_events_total", operation, result);
}

pub(crate) fn record_reservation<T>(operation: &'static str, result: &Result<T>) {
    observe("booking_reservations_total", operation, result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use venue_booking_core::ConflictReason;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(outcome_label(None), "ok");
        assert_eq!(
            outcome_label(Some(&BookingError::Conflict(ConflictReason::SoldOut))),
            "conflict"
        );
        assert_eq!(outcome_label(Some(&BookingError::not_found("event"))), "not_found");
        assert_eq!(outcome_label(Some(&BookingError::Internal("x".into()))), "error");
    }
}
