//! Custom Axum extractors.
//!
//! - `BearerToken`: the raw credential from the `Authorization` header
//! - `CurrentUser`: the authenticated [`Identity`] behind that credential
//!
//! # Examples
//!
//! ```ignore
//! async fn handler(
//!     State(state): State<AppState<S, R>>,
//!     CurrentUser(identity): CurrentUser,
//! ) -> Result<Json<Event>, AppError> {
//!     let event = state.bookings.create_event(&identity, draft).await?;
//!     Ok(Json(event))
//! }
//! ```

use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};
use venue_booking_auth::RevocationList;
use venue_booking_core::CapabilityStore;
use venue_booking_core::types::Identity;

use crate::error::AppError;
use crate::state::AppState;

/// Credential from the `Authorization` header.
///
/// The `Bearer ` prefix is kept; the authenticator strips it.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let credential = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        if credential.is_empty() {
            return Err(AppError::unauthorized("Empty bearer token"));
        }

        Ok(Self(credential.to_string()))
    }
}

/// Authenticated caller.
///
/// Rejects with 401 when the credential is missing, invalid, expired or
/// revoked, and with 400 when its claims are malformed.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

#[async_trait]
impl<S, R> FromRequestParts<AppState<S, R>> for CurrentUser
where
    S: CapabilityStore + Clone + 'static,
    R: RevocationList + Clone + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S, R>,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(credential) = BearerToken::from_request_parts(parts, state).await?;
        let identity = state.accounts.authenticate(&credential).await?;
        Ok(Self(identity))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    #[tokio::test]
    async fn test_bearer_token_from_header() {
        let req = Request::builder()
            .header("Authorization", "Bearer abc.def.ghi")
            .body(())
            .expect("Valid request");

        let (mut parts, _) = req.into_parts();
        let token = BearerToken::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(token.0, "Bearer abc.def.ghi");
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let req = Request::builder().body(()).expect("Valid request");

        let (mut parts, _) = req.into_parts();
        let err = BearerToken::from_request_parts(&mut parts, &())
            .await
            .expect_err("Should reject");

        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_blank_header_is_unauthorized() {
        let req = Request::builder()
            .header("Authorization", "   ")
            .body(())
            .expect("Valid request");

        let (mut parts, _) = req.into_parts();
        let err = BearerToken::from_request_parts(&mut parts, &())
            .await
            .expect_err("Should reject");

        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
