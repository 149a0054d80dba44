//! Application state for Axum handlers.

use std::sync::Arc;
use venue_booking::{AccountService, BookingService};
use venue_booking_auth::{RevocationList, TokenAuthenticator};
use venue_booking_core::CapabilityStore;
use venue_booking_core::environment::{Clock, SystemClock};

/// Services shared across all HTTP handlers.
///
/// Both services talk to the same Capability Store; neither caches entities
/// between requests.
pub struct AppState<S, R> {
    /// Event and reservation operations.
    pub bookings: BookingService<S>,
    /// Sign-up, login and credential checks.
    pub accounts: AccountService<S, R>,
}

impl<S: Clone, R: Clone> Clone for AppState<S, R> {
    fn clone(&self) -> Self {
        Self {
            bookings: self.bookings.clone(),
            accounts: self.accounts.clone(),
        }
    }
}

impl<S, R> AppState<S, R>
where
    S: CapabilityStore + Clone,
    R: RevocationList,
{
    /// Build the state using the system clock.
    #[must_use]
    pub fn new(store: S, authenticator: TokenAuthenticator<R>) -> Self {
        Self::with_clock(store, authenticator, Arc::new(SystemClock))
    }

    /// Build the state with an injected clock.
    ///
    /// The authenticator keeps its own clock; pass one built with the same
    /// clock to keep credential expiry consistent.
    #[must_use]
    pub fn with_clock(
        store: S,
        authenticator: TokenAuthenticator<R>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            bookings: BookingService::with_clock(store.clone(), Arc::clone(&clock)),
            accounts: AccountService::with_clock(store, authenticator, clock),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use venue_booking_auth::{InMemoryRevocationList, TokenConfig};
    use venue_booking_testing::InMemoryCapabilityStore;

    #[test]
    fn test_state_is_clone() {
        // Axum requires Clone state
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState<InMemoryCapabilityStore, InMemoryRevocationList>>();
    }

    #[test]
    fn test_services_share_the_store() {
        let store = InMemoryCapabilityStore::new();
        let authenticator =
            TokenAuthenticator::new(&TokenConfig::default(), InMemoryRevocationList::new());
        let state = AppState::new(store, authenticator);
        let cloned = state.clone();

        tokio_test::block_on(async {
            cloned
                .accounts
                .sign_up("alice", "pw", venue_booking_core::types::Role::Audience)
                .await
                .expect("sign up should succeed");
            let seen = state
                .bookings
                .store()
                .user_by_username("alice")
                .await
                .unwrap();
            assert!(seen.is_some());
        });
    }
}
