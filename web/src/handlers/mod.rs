//! HTTP handlers.
//!
//! Handlers only translate between HTTP and the booking services: they
//! extract the caller, parse the body or query, call one service operation
//! and map its result.

pub mod accounts;
pub mod events;
pub mod health;
pub mod reservations;
pub mod timeslots;

use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use serde::Deserialize;
use venue_booking_core::types::Page;

use crate::error::AppError;

/// `?limit=&offset=` on listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Maximum number of rows.
    pub limit: Option<i64>,
    /// Rows to skip.
    pub offset: Option<i64>,
}

impl PageQuery {
    /// Resolve against the listing's default limit.
    ///
    /// Returns `None` when neither parameter is given so the service applies
    /// its own default.
    ///
    /// # Errors
    ///
    /// Negative values are `400 Bad Request`.
    pub fn into_page(self, default_limit: i64) -> Result<Option<Page>, AppError> {
        if self.limit.is_none() && self.offset.is_none() {
            return Ok(None);
        }
        let page = Page::new(
            self.limit.unwrap_or(default_limit),
            self.offset.unwrap_or(0),
        )?;
        Ok(Some(page))
    }
}

pub(crate) fn page_query(
    query: Result<Query<PageQuery>, QueryRejection>,
    default_limit: i64,
) -> Result<Option<Page>, AppError> {
    let Query(query) = query?;
    query.into_page(default_limit)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_no_parameters_defers_to_service_default() {
        assert_eq!(PageQuery::default().into_page(5).unwrap(), None);
    }

    #[test]
    fn test_missing_limit_uses_listing_default() {
        let query = PageQuery {
            limit: None,
            offset: Some(10),
        };
        let page = query.into_page(5).unwrap().unwrap();
        assert_eq!((page.limit(), page.offset()), (5, 10));
    }

    #[test]
    fn test_negative_values_are_rejected() {
        let query = PageQuery {
            limit: Some(-1),
            offset: None,
        };
        assert_eq!(query.into_page(5).unwrap_err().status(), StatusCode::BAD_REQUEST);
    }
}
