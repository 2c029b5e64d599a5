//! Integration tests for registration endpoints.

mod common;

use axum::http::{header, Method, StatusCode};
use chrono::Duration;
use common::{
    admin_json_request, create_registration, empty_request, json_request, parse_response_body,
    registration_payload, test_config, TestApp,
};
use serde_json::json;

// ============================================================================
// Submission
// ============================================================================

#[tokio::test]
async fn test_create_registration_returns_normalized_record() {
    let app = TestApp::new(test_config());
    let mut payload = registration_payload();
    payload["email"] = json!("Amina@Example.COM");
    payload["name"] = json!("<b>Amina</b> Okello");

    let body = create_registration(&app, payload, "203.0.113.7").await;

    assert_eq!(body["email"], "amina@example.com");
    assert_eq!(body["name"], "bAmina/b Okello");
    assert_eq!(body["groupType"], "local");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["ipAddress"], "203.0.113.7");
    assert_eq!(body["location"]["city"], "Nairobi");
    assert!(body["id"].is_string());
}

#[tokio::test]
async fn test_create_registration_persists_record() {
    let app = TestApp::new(test_config());
    let body = create_registration(&app, registration_payload(), "203.0.113.7").await;

    let id = body["id"].as_str().unwrap().parse().unwrap();
    let stored = app.stores.registrations.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.email, body["email"].as_str().unwrap());
}

#[tokio::test]
async fn test_create_registration_lists_every_missing_field() {
    let app = TestApp::new(test_config());
    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/registrations",
            json!({"name": "Amina", "whatsappContact": "   "}),
            "203.0.113.7",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(
        body["missing"],
        json!(["email", "whatsappContact", "countryOfResidence"])
    );
    assert!(app.stores.registrations.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_registration_treats_non_text_values_as_missing() {
    let app = TestApp::new(test_config());
    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/registrations",
            json!({
                "name": true,
                "email": "a@b.com",
                "whatsappContact": {},
                "countryOfResidence": [],
                "groupType": "local"
            }),
            "203.0.113.7",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(
        body["missing"],
        json!(["name", "whatsappContact", "countryOfResidence"])
    );
    assert!(app.stores.registrations.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_registration_rejects_invalid_email() {
    let app = TestApp::new(test_config());
    let mut payload = registration_payload();
    payload["email"] = json!("not an email");

    let response = app
        .send(json_request(Method::POST, "/api/v1/registrations", payload, "203.0.113.7"))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert!(body.get("missing").is_none());
}

#[tokio::test]
async fn test_create_registration_rejects_non_object_body() {
    let app = TestApp::new(test_config());
    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/registrations",
            json!(["name", "email"]),
            "203.0.113.7",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_registration_ignores_non_address_forwarded_for() {
    let app = TestApp::new(test_config());
    let forwarded = "x".repeat(300);

    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/registrations",
            registration_payload(),
            &forwarded,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = parse_response_body(response).await;
    assert!(body.get("ipAddress").is_none());
}

#[tokio::test]
async fn test_unknown_group_type_defaults_to_diaspora() {
    let app = TestApp::new(test_config());
    let mut payload = registration_payload();
    payload["groupType"] = json!("martian");

    let body = create_registration(&app, payload, "203.0.113.7").await;
    assert_eq!(body["groupType"], "diaspora");
}

#[tokio::test]
async fn test_strict_group_type_rejects_unknown_value() {
    let mut config = test_config();
    config.registration.strict_group_type = true;
    let app = TestApp::new(config);
    let mut payload = registration_payload();
    payload["groupType"] = json!("martian");

    let response = app
        .send(json_request(Method::POST, "/api/v1/registrations", payload, "203.0.113.7"))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Rate limiting
// ============================================================================

#[tokio::test]
async fn test_double_submit_with_single_slot_is_rate_limited() {
    let mut config = test_config();
    config.rate_limit.max_requests = 1;
    config.rate_limit.window_secs = 60;
    let app = TestApp::new(config);

    let payload = json!({
        "name": "A",
        "email": "a@b.com",
        "whatsappContact": "+1",
        "countryOfResidence": "Kenya",
        "groupType": "local"
    });

    let first = app
        .send(json_request(
            Method::POST,
            "/api/v1/registrations",
            payload.clone(),
            "198.51.100.1",
        ))
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .send(json_request(
            Method::POST,
            "/api/v1/registrations",
            payload.clone(),
            "198.51.100.1",
        ))
        .await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = second
        .headers()
        .get(header::RETRY_AFTER)
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after > 0 && retry_after <= 60);
    let body = parse_response_body(second).await;
    assert_eq!(body["error"], "rate_limit_exceeded");
    assert_eq!(body["retryAfter"], retry_after);

    // Another client is unaffected
    let other = app
        .send(json_request(
            Method::POST,
            "/api/v1/registrations",
            payload.clone(),
            "198.51.100.2",
        ))
        .await;
    assert_eq!(other.status(), StatusCode::CREATED);

    // The window reopens once it has fully elapsed
    app.clock.advance(Duration::seconds(60));
    let after_window = app
        .send(json_request(
            Method::POST,
            "/api/v1/registrations",
            payload,
            "198.51.100.1",
        ))
        .await;
    assert_eq!(after_window.status(), StatusCode::CREATED);

    assert_eq!(app.stores.registrations.count_all().await.unwrap(), 3);
}

// ============================================================================
// Listing and moderation
// ============================================================================

#[tokio::test]
async fn test_list_registrations_newest_first() {
    let app = TestApp::new(test_config());
    let first = create_registration(&app, registration_payload(), "203.0.113.7").await;
    app.clock.advance(Duration::minutes(1));
    let second = create_registration(&app, registration_payload(), "203.0.113.8").await;

    let response = app
        .send(empty_request(Method::GET, "/api/v1/registrations", false))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    let list = body["registrations"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["id"], second["id"]);
    assert_eq!(list[1]["id"], first["id"]);
}

#[tokio::test]
async fn test_admin_key_guards_moderation_endpoints() {
    let app = TestApp::with_admin_key(test_config());
    let created = create_registration(&app, registration_payload(), "203.0.113.7").await;
    let uri = format!("/api/v1/registrations/{}", created["id"].as_str().unwrap());

    let response = app.send(empty_request(Method::GET, &uri, false)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .send(empty_request(Method::GET, "/api/v1/registrations", false))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Stats stay public
    let response = app
        .send(empty_request(Method::GET, "/api/v1/registrations?stats=true", false))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.send(empty_request(Method::GET, &uri, true)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["id"], created["id"]);
}

#[tokio::test]
async fn test_get_unknown_registration_is_404() {
    let app = TestApp::new(test_config());
    let uri = format!("/api/v1/registrations/{}", uuid::Uuid::new_v4());

    let response = app.send(empty_request(Method::GET, &uri, false)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.send(empty_request(Method::DELETE, &uri, false)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_registration_status() {
    let app = TestApp::with_admin_key(test_config());
    let created = create_registration(&app, registration_payload(), "203.0.113.7").await;
    let uri = format!("/api/v1/registrations/{}", created["id"].as_str().unwrap());

    app.clock.advance(Duration::minutes(5));
    let response = app
        .send(admin_json_request(
            Method::PATCH,
            &uri,
            json!({"status": "verified", "countryOfResidence": "Ghana"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "verified");
    assert_eq!(body["countryOfResidence"], "Ghana");
    assert_eq!(body["email"], created["email"]);
    assert_eq!(body["createdAt"], created["createdAt"]);
    assert_ne!(body["updatedAt"], created["updatedAt"]);
}

#[tokio::test]
async fn test_update_registration_status_only() {
    let app = TestApp::with_admin_key(test_config());
    let created = create_registration(&app, registration_payload(), "203.0.113.7").await;
    let uri = format!("/api/v1/registrations/{}", created["id"].as_str().unwrap());

    let response = app
        .send(admin_json_request(Method::PATCH, &uri, json!({"status": "active"})))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "active");
    assert_eq!(body["name"], created["name"]);
    assert_eq!(body["countryOfResidence"], created["countryOfResidence"]);
}

#[tokio::test]
async fn test_update_registration_rejects_invalid_status() {
    let app = TestApp::with_admin_key(test_config());
    let created = create_registration(&app, registration_payload(), "203.0.113.7").await;
    let uri = format!("/api/v1/registrations/{}", created["id"].as_str().unwrap());

    let response = app
        .send(admin_json_request(Method::PATCH, &uri, json!({"status": "banned"})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.send(empty_request(Method::GET, &uri, true)).await;
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn test_update_registration_wrong_field_type_is_structured_400() {
    let app = TestApp::with_admin_key(test_config());
    let created = create_registration(&app, registration_payload(), "203.0.113.7").await;
    let uri = format!("/api/v1/registrations/{}", created["id"].as_str().unwrap());

    let response = app
        .send(admin_json_request(Method::PATCH, &uri, json!({"status": 5})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].is_string());
    assert!(!body.to_string().contains("invalid type"));
}

#[tokio::test]
async fn test_update_registration_without_changes_is_400() {
    let app = TestApp::new(test_config());
    let created = create_registration(&app, registration_payload(), "203.0.113.7").await;
    let uri = format!("/api/v1/registrations/{}", created["id"].as_str().unwrap());

    let response = app
        .send(json_request(Method::PATCH, &uri, json!({"name": "   "}), "203.0.113.7"))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_unknown_registration_is_404() {
    let app = TestApp::new(test_config());
    let uri = format!("/api/v1/registrations/{}", uuid::Uuid::new_v4());

    let response = app
        .send(json_request(Method::PATCH, &uri, json!({"status": "active"}), "203.0.113.7"))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_registration() {
    let app = TestApp::with_admin_key(test_config());
    let created = create_registration(&app, registration_payload(), "203.0.113.7").await;
    let uri = format!("/api/v1/registrations/{}", created["id"].as_str().unwrap());

    let response = app.send(empty_request(Method::DELETE, &uri, true)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.send(empty_request(Method::GET, &uri, true)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Cross-cutting
// ============================================================================

#[tokio::test]
async fn test_cors_preflight() {
    let app = TestApp::new(test_config());
    let request = axum::http::Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/registrations")
        .header(header::ORIGIN, "https://community.example.org")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let app = TestApp::new(test_config());
    let response = app
        .send(empty_request(Method::GET, "/api/health/live", false))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}
