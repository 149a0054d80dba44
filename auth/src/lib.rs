//! # Venue Booking Auth
//!
//! Token authentication for the venue booking engine.
//!
//! - **Tokens**: HS256 signed claims (`username`, `role`, `iat`, `exp`)
//! - **Revocation list**: a deny-list of credentials revoked before expiry,
//!   file-backed or in-memory, guarded by a single mutex
//! - **Passwords**: Argon2id PHC strings verified in constant time
//!
//! ## Example
//!
//! ```
//! use venue_booking_auth::{InMemoryRevocationList, TokenAuthenticator, TokenConfig};
//! use venue_booking_core::types::{Identity, Role};
//!
//! # tokio_test::block_on(async {
//! let auth = TokenAuthenticator::new(&TokenConfig::new("secret"), InMemoryRevocationList::new());
//! let token = auth.issue(&Identity::new("alice", Role::Audience)).unwrap();
//!
//! assert_eq!(auth.authenticate(&token).await.unwrap().username, "alice");
//!
//! auth.revoke(&token).await.unwrap();
//! assert!(auth.authenticate(&token).await.is_err());
//! # });
//! ```

pub mod authenticator;
pub mod config;
pub mod error;
pub mod password;
pub mod revocation;
pub mod token;

pub use authenticator::{TokenAuthenticator, strip_bearer};
pub use config::TokenConfig;
pub use error::{AuthError, Result};
pub use password::{hash_password, verify_password};
pub use revocation::{FileRevocationList, InMemoryRevocationList, RevocationList};
pub use token::{Claims, TokenCodec};
