//! Security tests for the token authenticator.
//!
//! Cover tampering, foreign signatures, expiry and revocations that must
//! survive a restart of the file-backed list.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Duration;
use venue_booking_auth::{
    AuthError, Claims, FileRevocationList, RevocationList, TokenAuthenticator, TokenConfig,
};
use venue_booking_core::environment::Clock;
use venue_booking_core::types::{Identity, Role};
use venue_booking_testing::{FixedClock, test_clock};

const SECRET: &str = "security-test-secret";

fn authenticator(
    revocations: FileRevocationList,
    clock: FixedClock,
) -> TokenAuthenticator<FileRevocationList> {
    TokenAuthenticator::with_clock(&TokenConfig::new(SECRET), revocations, Arc::new(clock))
}

fn fresh_list() -> (tempfile::TempDir, FileRevocationList) {
    let dir = tempfile::tempdir().unwrap();
    let list = FileRevocationList::new(dir.path().join("TokenRevocationList.dat"));
    (dir, list)
}

#[tokio::test]
async fn test_tampered_payload_is_rejected() {
    let (_dir, list) = fresh_list();
    let clock = test_clock();
    let auth = authenticator(list, clock.clone());
    let token = auth.issue(&Identity::new("mallory", Role::Audience)).unwrap();

    let mut parts: Vec<String> = token.split('.').map(ToString::to_string).collect();
    let escalated = Claims::new(
        &Identity::new("mallory", Role::Artist),
        clock.now(),
        Duration::hours(1),
    );
    parts[1] = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&escalated).unwrap());
    let forged = parts.join(".");

    assert!(matches!(
        auth.authenticate(&forged).await,
        Err(AuthError::TokenInvalid(_))
    ));
}

#[tokio::test]
async fn test_foreign_secret_is_rejected() {
    let (_dir, list) = fresh_list();
    let clock = test_clock();
    let auth = authenticator(list, clock.clone());

    let claims = Claims::new(
        &Identity::new("mallory", Role::Artist),
        clock.now(),
        Duration::hours(1),
    );
    let forged = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(b"some-other-secret"),
    )
    .unwrap();

    assert!(matches!(
        auth.authenticate(&forged).await,
        Err(AuthError::TokenInvalid(_))
    ));
}

#[tokio::test]
async fn test_other_algorithm_is_rejected() {
    let (_dir, list) = fresh_list();
    let clock = test_clock();
    let auth = authenticator(list, clock.clone());

    let claims = Claims::new(
        &Identity::new("mallory", Role::Artist),
        clock.now(),
        Duration::hours(1),
    );
    let forged = jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS384),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    assert!(matches!(
        auth.authenticate(&forged).await,
        Err(AuthError::TokenInvalid(_))
    ));
}

#[tokio::test]
async fn test_token_expires_exactly_after_ttl() {
    let (_dir, list) = fresh_list();
    let issued_at = test_clock().now();
    let identity = Identity::new("alice", Role::Audience);
    let token = authenticator(list.clone(), FixedClock::new(issued_at))
        .issue(&identity)
        .unwrap();

    let almost = authenticator(
        list.clone(),
        FixedClock::new(issued_at + Duration::seconds(3599)),
    );
    assert_eq!(almost.authenticate(&token).await.unwrap(), identity);

    let after = authenticator(list, FixedClock::new(issued_at + Duration::seconds(3601)));
    assert_eq!(after.authenticate(&token).await, Err(AuthError::TokenExpired));
}

#[tokio::test]
async fn test_revocation_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("TokenRevocationList.dat");

    let before = authenticator(FileRevocationList::new(&path), test_clock());
    let revoked = before.issue(&Identity::new("alice", Role::Audience)).unwrap();
    let kept = before.issue(&Identity::new("bob", Role::Audience)).unwrap();
    before.revoke(&format!("Bearer {revoked}")).await.unwrap();

    let after = authenticator(FileRevocationList::new(&path), test_clock());
    assert_eq!(
        after.authenticate(&revoked).await,
        Err(AuthError::TokenRevoked)
    );
    assert_eq!(after.authenticate(&kept).await.unwrap().username, "bob");
    assert!(after.revocations().is_revoked(&revoked).await.unwrap());
}

#[tokio::test]
async fn test_revoked_token_rejected_before_expiry_check() {
    let (_dir, list) = fresh_list();
    let issued_at = test_clock().now();
    let token = authenticator(list.clone(), FixedClock::new(issued_at))
        .issue(&Identity::new("alice", Role::Artist))
        .unwrap();
    list.revoke(&token).await.unwrap();

    let later = authenticator(list, FixedClock::new(issued_at + Duration::hours(5)));
    assert_eq!(later.authenticate(&token).await, Err(AuthError::TokenRevoked));
}
