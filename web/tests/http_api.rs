//! HTTP API tests driving the router with `tower::ServiceExt::oneshot`
//! against the in-memory Capability Store.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code uses expect for clear failure messages

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use venue_booking_auth::{InMemoryRevocationList, TokenAuthenticator, TokenConfig};
use venue_booking_core::types::{Identity, Role, User};
use venue_booking_testing::{BookingFixture, at, test_clock};
use venue_booking_web::{AppState, CORRELATION_ID_HEADER, build_router};

struct Harness {
    fixture: BookingFixture,
    state: AppState<venue_booking_testing::InMemoryCapabilityStore, InMemoryRevocationList>,
}

impl Harness {
    async fn new(capacity: i64) -> Self {
        let fixture = BookingFixture::new(capacity).await;
        let clock = Arc::new(test_clock());
        let authenticator = TokenAuthenticator::with_clock(
            &TokenConfig::new("http-test-secret"),
            InMemoryRevocationList::new(),
            clock.clone(),
        );
        let state = AppState::with_clock(fixture.store.clone(), authenticator, clock);
        Self { fixture, state }
    }

    fn app(&self) -> Router {
        build_router(self.state.clone())
    }

    fn token_for(&self, user: &User) -> String {
        self.state
            .accounts
            .authenticator()
            .issue(&Identity::new(user.username.clone(), user.role))
            .expect("Failed to issue token")
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    fn draft(&self) -> Value {
        json!({
            "name": "Opening Night",
            "genre_id": self.fixture.genre_id,
            "price": 3000,
            "timeslot_ids": [self.fixture.morning, self.fixture.noon],
            "start_at": at(10, 0, 0),
            "end_at": at(12, 0, 0),
        })
    }

    async fn publish(&self) -> String {
        let token = self.token_for(&self.fixture.artist);
        let (status, body) = self
            .send(Method::POST, "/api/events", Some(&token), Some(self.draft()))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let harness = Harness::new(10).await;
    let response = harness
        .app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(CORRELATION_ID_HEADER));
}

#[tokio::test]
async fn test_sign_up_login_and_read_profile() {
    let harness = Harness::new(10).await;

    let (status, profile) = harness
        .send(
            Method::POST,
            "/api/users",
            None,
            Some(json!({"username": "alice", "password": "s3cret", "role": "audience"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(profile["role"], "audience");
    assert!(profile.get("password_hash").is_none());

    let (status, session) = harness
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({"username": "alice", "password": "s3cret"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["user_id"], profile["id"]);

    let token = session["access_token"].as_str().unwrap();
    let uri = format!("/api/users/{}", profile["id"].as_str().unwrap());
    let (status, read) = harness.send(Method::GET, &uri, Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["username"], "alice");
}

#[tokio::test]
async fn test_sign_up_rejects_owner_and_duplicates() {
    let harness = Harness::new(10).await;

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/users",
            None,
            Some(json!({"username": "boss", "password": "pw", "role": "owner"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/users",
            None,
            Some(json!({"username": "artist", "password": "pw", "role": "artist"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "USERNAME_TAKEN");
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let harness = Harness::new(10).await;
    let (status, body) = harness
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({"username": "artist", "password": "guess"})),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_protected_routes_require_a_valid_credential() {
    let harness = Harness::new(10).await;
    let draft = harness.draft();

    let (status, _) = harness
        .send(Method::POST, "/api/events", None, Some(draft.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = harness
        .send(Method::POST, "/api/events", Some("not-a-jwt"), Some(draft))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_artist_publishes_and_anyone_reads() {
    let harness = Harness::new(10).await;
    let event_id = harness.publish().await;

    let (status, event) = harness
        .send(Method::GET, &format!("/api/events/{event_id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(event["capacity"], 10);
    assert_eq!(event["reserved_seats"], 0);
    assert_eq!(event["timeslot_ids"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_audience_cannot_publish() {
    let harness = Harness::new(10).await;
    let token = harness.token_for(&harness.fixture.audience);

    let (status, body) = harness
        .send(Method::POST, "/api/events", Some(&token), Some(harness.draft()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_taken_slot_is_a_conflict() {
    let harness = Harness::new(10).await;
    harness.publish().await;
    let token = harness.token_for(&harness.fixture.other_artist);

    let (status, body) = harness
        .send(Method::POST, "/api/events", Some(&token), Some(harness.draft()))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "TIMESLOT_TAKEN");
}

#[tokio::test]
async fn test_malformed_body_and_path_are_bad_requests() {
    let harness = Harness::new(10).await;
    let token = harness.token_for(&harness.fixture.artist);

    let (status, _) = harness
        .send(
            Method::POST,
            "/api/events",
            Some(&token),
            Some(json!({"name": "missing everything"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = harness
        .send(Method::GET, "/api/events/not-a-uuid", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reservation_lifecycle() {
    let harness = Harness::new(10).await;
    let event_id = harness.publish().await;
    let token = harness.token_for(&harness.fixture.audience);
    let reserve_uri = format!("/api/events/{event_id}/reservations");

    let (status, reservation) = harness
        .send(Method::POST, &reserve_uri, Some(&token), Some(json!({"seat_count": 4})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reservation["seat_count"], 4);

    let (status, body) = harness
        .send(Method::POST, &reserve_uri, Some(&token), Some(json!({"seat_count": 1})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_RESERVED");

    let (_, event) = harness
        .send(Method::GET, &format!("/api/events/{event_id}"), None, None)
        .await;
    assert_eq!(event["reserved_seats"], 4);

    let reservation_uri = format!("/api/reservations/{}", reservation["id"].as_str().unwrap());
    let (status, read) = harness
        .send(Method::GET, &reservation_uri, Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read, reservation);

    let stranger = harness.token_for(&harness.fixture.other_audience);
    let (status, _) = harness
        .send(Method::DELETE, &reservation_uri, Some(&stranger), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = harness
        .send(Method::DELETE, &reservation_uri, Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = harness
        .send(Method::GET, &reservation_uri, Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sold_out_is_a_conflict() {
    let harness = Harness::new(5).await;
    let event_id = harness.publish().await;
    let reserve_uri = format!("/api/events/{event_id}/reservations");

    let first = harness.token_for(&harness.fixture.audience);
    let (status, _) = harness
        .send(Method::POST, &reserve_uri, Some(&first), Some(json!({"seat_count": 4})))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let second = harness.token_for(&harness.fixture.other_audience);
    let (status, body) = harness
        .send(Method::POST, &reserve_uri, Some(&second), Some(json!({"seat_count": 2})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SOLD_OUT");
    assert_eq!(body["message"], "Tickets are all gone");
}

#[tokio::test]
async fn test_listings_honour_paging() {
    let harness = Harness::new(100).await;
    let event_id = harness.publish().await;
    let reserve_uri = format!("/api/events/{event_id}/reservations");

    for user in [&harness.fixture.audience, &harness.fixture.other_audience] {
        let token = harness.token_for(user);
        let (status, _) = harness
            .send(Method::POST, &reserve_uri, Some(&token), Some(json!({"seat_count": 1})))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let artist = harness.token_for(&harness.fixture.artist);
    let (status, all) = harness.send(Method::GET, &reserve_uri, Some(&artist), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (status, page) = harness
        .send(
            Method::GET,
            &format!("{reserve_uri}?limit=1&offset=1"),
            Some(&artist),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page.as_array().unwrap(), &all.as_array().unwrap()[1..]);

    let (status, _) = harness
        .send(Method::GET, &format!("{reserve_uri}?limit=-1"), Some(&artist), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let audience = harness.token_for(&harness.fixture.audience);
    let user_uri = format!("/api/users/{}/reservations", harness.fixture.audience.id);
    let (status, mine) = harness.send(Method::GET, &user_uri, Some(&audience), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (status, _) = harness.send(Method::GET, &reserve_uri, Some(&audience), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_logout_revokes_the_credential() {
    let harness = Harness::new(10).await;
    let token = harness.token_for(&harness.fixture.artist);

    let (status, _) = harness
        .send(Method::POST, "/api/logout", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = harness
        .send(Method::POST, "/api/events", Some(&token), Some(harness.draft()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = harness
        .send(Method::POST, "/api/logout", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_public_event_listing_filters_by_artist() {
    let harness = Harness::new(10).await;
    let event_id = harness.publish().await;

    let (status, all) = harness.send(Method::GET, "/api/events", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);
    assert_eq!(all[0]["id"], event_id.as_str());
    assert_eq!(all[0]["capacity"], 10);

    let artist_uri = format!("/api/events?user_id={}", harness.fixture.artist.id);
    let (status, mine) = harness.send(Method::GET, &artist_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let other_uri = format!("/api/events?user_id={}", harness.fixture.other_artist.id);
    let (status, none) = harness.send(Method::GET, &other_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(none.as_array().unwrap().is_empty());

    let (status, _) = harness
        .send(Method::GET, "/api/events?offset=1", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = harness
        .send(Method::GET, "/api/events?user_id=not-a-uuid", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_free_timeslots_for_artists_and_owners() {
    let harness = Harness::new(10).await;
    harness.publish().await;
    let uri = format!(
        "/api/venues/{}/timeslots?from=2025-06-01T00:00:00Z&to=2025-06-01T23:59:59Z",
        harness.fixture.venue_id
    );

    let artist = harness.token_for(&harness.fixture.artist);
    let (status, slots) = harness.send(Method::GET, &uri, Some(&artist), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = slots
        .as_array()
        .unwrap()
        .iter()
        .map(|slot| slot["id"].as_str().unwrap())
        .collect();
    let expected = [harness.fixture.afternoon, harness.fixture.late_night]
        .map(|id| id.to_string());
    assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());

    let owner = harness.token_for(&harness.fixture.owner);
    let (status, _) = harness.send(Method::GET, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);

    let audience = harness.token_for(&harness.fixture.audience);
    let (status, _) = harness.send(Method::GET, &uri, Some(&audience), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = harness.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = harness
        .send(
            Method::GET,
            &format!("/api/venues/{}/timeslots?from=yesterday", harness.fixture.venue_id),
            Some(&artist),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
