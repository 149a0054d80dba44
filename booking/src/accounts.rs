//! Accounts: sign-up, login, logout and user lookup.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use venue_booking_auth::{RevocationList, TokenAuthenticator, hash_password, verify_password};
use venue_booking_core::environment::{Clock, SystemClock};
use venue_booking_core::policy::{Operation, Ownership, authorize};
use venue_booking_core::store::CapabilityStore;
use venue_booking_core::types::{Identity, Role, User, UserId, UserProfile};
use venue_booking_core::{BookingError, Result};

use crate::orchestrator::resolve_caller;

/// Result of a successful login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Logged-in user.
    pub user_id: UserId,
    /// Signed credential to present as a bearer token.
    pub access_token: String,
}

/// Registers users and issues, verifies and revokes their credentials.
pub struct AccountService<S, R> {
    store: S,
    authenticator: TokenAuthenticator<R>,
    clock: Arc<dyn Clock>,
}

impl<S: Clone, R: Clone> Clone for AccountService<S, R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            authenticator: self.authenticator.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: CapabilityStore, R: RevocationList> AccountService<S, R> {
    /// Create a service using the system clock for account timestamps.
    #[must_use]
    pub fn new(store: S, authenticator: TokenAuthenticator<R>) -> Self {
        Self::with_clock(store, authenticator, Arc::new(SystemClock))
    }

    /// Create a service with an injected clock.
    #[must_use]
    pub fn with_clock(store: S, authenticator: TokenAuthenticator<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            authenticator,
            clock,
        }
    }

    /// The token authenticator.
    #[must_use]
    pub const fn authenticator(&self) -> &TokenAuthenticator<R> {
        &self.authenticator
    }

    /// Register a new audience member or artist.
    ///
    /// # Errors
    ///
    /// - Empty username or password, or the `owner` role → `InvalidInput`
    /// - Username taken → `Conflict(UsernameTaken)`
    pub async fn sign_up(&self, username: &str, password: &str, role: Role) -> Result<UserProfile> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(BookingError::InvalidInput(
                "username and password are required".to_string(),
            ));
        }
        if !role.is_self_assignable() {
            return Err(BookingError::InvalidInput(format!(
                "role {role} cannot be chosen at sign-up"
            )));
        }

        let password_hash = hash_password(password)?;
        let now = self.clock.now();
        let user = User {
            id: UserId::new(),
            username: username.to_string(),
            role,
            password_hash,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_user(&user).await?;

        tracing::info!(user_id = %user.id, role = %role, "User registered");
        Ok(UserProfile::from(&user))
    }

    /// Check a username and password and issue a credential.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for an unknown user or a wrong password.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let Some(user) = self.store.user_by_username(username.trim()).await? else {
            return Err(BookingError::Unauthorized);
        };

        // Seeded accounts without a credential can never log in.
        if user.password_hash.is_empty() || !verify_password(password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "Login rejected");
            return Err(BookingError::Unauthorized);
        }

        let access_token = self
            .authenticator
            .issue(&Identity::new(user.username.clone(), user.role))?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(Session {
            user_id: user.id,
            access_token,
        })
    }

    /// Verify a credential.
    ///
    /// # Errors
    ///
    /// `Unauthorized` (bad, expired or revoked), `MalformedCredential`.
    pub async fn authenticate(&self, credential: &str) -> Result<Identity> {
        Ok(self.authenticator.authenticate(credential).await?)
    }

    /// Revoke a credential without verifying it.
    ///
    /// # Errors
    ///
    /// `MalformedCredential` if it cannot be stored, `Internal` on storage failure.
    pub async fn revoke(&self, credential: &str) -> Result<()> {
        Ok(self.authenticator.revoke(credential).await?)
    }

    /// Verify a credential, then revoke it.
    ///
    /// # Errors
    ///
    /// Same as [`Self::authenticate`] and [`Self::revoke`].
    pub async fn logout(&self, credential: &str) -> Result<()> {
        let identity = self.authenticate(credential).await?;
        self.revoke(credential).await?;
        tracing::info!(username = %identity.username, "User logged out");
        Ok(())
    }

    /// Read a user profile: oneself, or anyone for owners.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `NotFound`, `Forbidden`, `Internal`.
    pub async fn get_user(&self, identity: &Identity, user_id: UserId) -> Result<UserProfile> {
        let caller = resolve_caller(&self.store, identity).await?;
        let user = self
            .store
            .user(user_id)
            .await?
            .ok_or(BookingError::not_found("user"))?;
        authorize(
            Operation::ReadUser,
            caller.role,
            Ownership::from_match(user.id == caller.id),
        )?;
        Ok(UserProfile::from(&user))
    }
}
