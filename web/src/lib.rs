//! HTTP adapter for the venue booking engine.
//!
//! A thin axum layer over [`venue_booking::BookingService`] and
//! [`venue_booking::AccountService`]:
//!
//! 1. **Extract** the caller from `Authorization: Bearer <credential>`
//! 2. **Parse** path, query and JSON body
//! 3. **Call** one service operation
//! 4. **Map** the result, or the error taxonomy, to an HTTP response
//!
//! Every request runs in a span carrying its `X-Correlation-ID`.
//!
//! # Example
//!
//! ```
//! use venue_booking_auth::{InMemoryRevocationList, TokenAuthenticator, TokenConfig};
//! use venue_booking_testing::InMemoryCapabilityStore;
//! use venue_booking_web::{AppState, build_router};
//!
//! let authenticator =
//!     TokenAuthenticator::new(&TokenConfig::default(), InMemoryRevocationList::new());
//! let state = AppState::new(InMemoryCapabilityStore::new(), authenticator);
//! let _app = build_router(state);
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use extractors::{BearerToken, CurrentUser};
pub use middleware::{CORRELATION_ID_HEADER, CorrelationId, correlation_id_layer};
pub use router::{build_router, metrics_router};
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
