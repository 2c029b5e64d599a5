//! Common test utilities for integration tests.
//!
//! The router runs against in-memory stores and a manual clock, so no
//! database is needed.

// Not every helper is used by every test binary.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, Response},
    Router,
};
use community_registry_api::{
    app::{create_router, AppState, Stores},
    config::Config,
    middleware::ADMIN_KEY_HEADER,
};
use domain::services::{Clock, ManualClock};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use serde_json::{json, Value};
use std::sync::Arc;

pub const TEST_ADMIN_KEY: &str = "test-admin-key";

/// Test configuration: in-memory stores, generous rate limit, no admin key.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.logging.format = "pretty".to_string();
    config.rate_limit.max_requests = 100;
    config.rate_limit.window_secs = 60;
    config
}

/// Router plus the handles tests need to poke at.
pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
    pub stores: Stores,
}

impl TestApp {
    pub fn new(config: Config) -> Self {
        let clock = Arc::new(ManualClock::default());
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let stores = Stores::in_memory(dyn_clock.clone());
        let state = AppState::new(config, stores.clone(), dyn_clock);
        Self {
            router: create_router(state),
            clock,
            stores,
        }
    }

    pub fn with_admin_key(mut config: Config) -> Self {
        config.security.admin_key = TEST_ADMIN_KEY.to_string();
        Self::new(config)
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        use tower::ServiceExt;
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// A valid registration payload with generated contact details.
pub fn registration_payload() -> Value {
    let name: String = Name().fake();
    let email: String = SafeEmail().fake();
    json!({
        "name": name,
        "email": email,
        "whatsappContact": "+254700000000",
        "countryOfOrigin": "Kenya",
        "countryOfResidence": "Kenya",
        "groupType": "local",
        "location": {"city": "Nairobi", "timezone": "Africa/Nairobi"}
    })
}

/// A valid partner payload with generated contact details.
pub fn partner_payload() -> Value {
    let name: String = Name().fake();
    let email: String = SafeEmail().fake();
    json!({
        "organizationName": "Harvest Trust",
        "contactName": name,
        "email": email,
        "website": "https://harvest.example.org"
    })
}

/// Build a JSON request from a client address.
pub fn json_request(method: Method, uri: &str, body: Value, client_ip: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", client_ip)
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a JSON request carrying the admin key.
pub fn admin_json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(ADMIN_KEY_HEADER, TEST_ADMIN_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a body-less request, optionally with the admin key.
pub fn empty_request(method: Method, uri: &str, admin: bool) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if admin {
        builder = builder.header(ADMIN_KEY_HEADER, TEST_ADMIN_KEY);
    }
    builder.body(Body::empty()).unwrap()
}

/// Parse a response body as JSON.
pub async fn parse_response_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&body).unwrap_or_else(|_| {
        panic!("Failed to parse response body: {:?}", String::from_utf8_lossy(&body))
    })
}

/// Submit a registration and return the created record.
pub async fn create_registration(app: &TestApp, payload: Value, client_ip: &str) -> Value {
    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/registrations",
            payload,
            client_ip,
        ))
        .await;
    let status = response.status();
    let body = parse_response_body(response).await;
    assert_eq!(status, 201, "unexpected response: {}", body);
    body
}
