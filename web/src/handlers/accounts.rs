//! Account endpoints.
//!
//! - POST /api/users - Sign up as audience or artist
//! - POST /api/login - Exchange username and password for a credential
//! - POST /api/logout - Revoke the presented credential
//! - GET /api/users/:user_id - Read a profile (self, or anyone for owners)

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;
use venue_booking::Session;
use venue_booking_auth::RevocationList;
use venue_booking_core::CapabilityStore;
use venue_booking_core::types::{Role, UserId, UserProfile};

use crate::error::AppError;
use crate::extractors::{BearerToken, CurrentUser};
use crate::state::AppState;

/// Request to register a user.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    /// Unique login name
    pub username: String,
    /// Plain-text password, hashed before storage
    pub password: String,
    /// `audience` or `artist`
    pub role: Role,
}

/// Request to log in.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login name
    pub username: String,
    /// Plain-text password
    pub password: String,
}

/// Register a user.
///
/// # Errors
///
/// 400 on invalid input or the `owner` role, 409 if the username is taken.
pub async fn sign_up<S, R>(
    State(state): State<AppState<S, R>>,
    body: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserProfile>), AppError>
where
    S: CapabilityStore + Clone + 'static,
    R: RevocationList + Clone + 'static,
{
    let Json(request) = body?;
    let profile = state
        .accounts
        .sign_up(&request.username, &request.password, request.role)
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// Log in and receive a bearer credential.
///
/// # Errors
///
/// 401 on unknown username or wrong password.
pub async fn login<S, R>(
    State(state): State<AppState<S, R>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Session>, AppError>
where
    S: CapabilityStore + Clone + 'static,
    R: RevocationList + Clone + 'static,
{
    let Json(request) = body?;
    let session = state
        .accounts
        .login(&request.username, &request.password)
        .await?;
    Ok(Json(session))
}

/// Revoke the presented credential.
///
/// # Errors
///
/// 401 if the credential is already invalid.
pub async fn logout<S, R>(
    State(state): State<AppState<S, R>>,
    BearerToken(credential): BearerToken,
) -> Result<StatusCode, AppError>
where
    S: CapabilityStore + Clone + 'static,
    R: RevocationList + Clone + 'static,
{
    state.accounts.logout(&credential).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Read a user profile.
///
/// # Errors
///
/// 401, 403 (someone else's profile), 404.
pub async fn get_user<S, R>(
    State(state): State<AppState<S, R>>,
    CurrentUser(identity): CurrentUser,
    path: Result<Path<UserId>, PathRejection>,
) -> Result<Json<UserProfile>, AppError>
where
    S: CapabilityStore + Clone + 'static,
    R: RevocationList + Clone + 'static,
{
    let Path(user_id) = path?;
    let profile = state.accounts.get_user(&identity, user_id).await?;
    Ok(Json(profile))
}
