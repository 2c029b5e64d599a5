//! Integration tests for the statistics snapshot and visit tracking.

mod common;

use axum::http::{Method, StatusCode};
use chrono::Duration;
use common::{
    create_registration, empty_request, json_request, parse_response_body, registration_payload,
    test_config, TestApp,
};
use serde_json::json;

async fn fetch_stats(app: &TestApp) -> serde_json::Value {
    let response = app
        .send(empty_request(Method::GET, "/api/v1/registrations?stats=true", false))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    parse_response_body(response).await
}

async fn register_from(app: &TestApp, country: &str, client_ip: &str) {
    let mut payload = registration_payload();
    payload["countryOfResidence"] = json!(country);
    create_registration(app, payload, client_ip).await;
}

#[tokio::test]
async fn test_stats_on_empty_store() {
    let app = TestApp::new(test_config());
    let body = fetch_stats(&app).await;

    assert_eq!(body["totalRegistrations"], 0);
    assert_eq!(body["todayRegistrations"], 0);
    assert_eq!(body["thisWeekRegistrations"], 0);
    assert_eq!(body["thisMonthRegistrations"], 0);
    assert_eq!(body["topCountries"], json!([]));
    assert_eq!(body["recentActivity"], json!([]));
    assert_eq!(body["visitStats"]["totalVisits"], 0);
}

#[tokio::test]
async fn test_stats_windows_and_ranking() {
    let app = TestApp::new(test_config());

    register_from(&app, "Ghana", "10.0.0.1").await;
    app.clock.advance(Duration::days(30));
    register_from(&app, "Kenya", "10.0.0.2").await;
    app.clock.advance(Duration::days(5));
    register_from(&app, "Kenya", "10.0.0.3").await;
    app.clock.advance(Duration::days(4));
    register_from(&app, "Uganda", "10.0.0.4").await;
    app.clock.advance(Duration::hours(1));

    let body = fetch_stats(&app).await;
    assert_eq!(body["totalRegistrations"], 4);
    assert_eq!(body["todayRegistrations"], 1);
    assert_eq!(body["thisWeekRegistrations"], 2);
    assert_eq!(body["thisMonthRegistrations"], 3);
    assert_eq!(body["topCountries"][0], json!({"country": "Kenya", "count": 2}));
    assert_eq!(body["topCountries"].as_array().unwrap().len(), 3);

    let recent = body["recentActivity"].as_array().unwrap();
    assert_eq!(recent.len(), 4);
    assert!(recent[0].get("email").is_none());
    assert!(recent[0].get("whatsappContact").is_none());
}

#[tokio::test]
async fn test_blank_residence_is_rejected_before_stats() {
    let app = TestApp::new(test_config());
    let mut payload = registration_payload();
    payload["countryOfResidence"] = json!("   ");

    let response = app
        .send(json_request(Method::POST, "/api/v1/registrations", payload, "10.0.0.9"))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(fetch_stats(&app).await["totalRegistrations"], 0);
}

#[tokio::test]
async fn test_visits_feed_stats() {
    let app = TestApp::new(test_config());

    for page in ["/", "/join", "/", "/about"] {
        let response = app
            .send(json_request(
                Method::POST,
                "/api/v1/visits",
                json!({"page": page}),
                "10.0.0.1",
            ))
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let body = fetch_stats(&app).await;
    assert_eq!(body["visitStats"]["totalVisits"], 4);
    assert_eq!(body["visitStats"]["todayVisits"], 4);
    assert_eq!(
        body["visitStats"]["topPages"][0],
        json!({"page": "/", "count": 2})
    );
}

#[tokio::test]
async fn test_empty_visit_page_is_rejected() {
    let app = TestApp::new(test_config());
    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/visits",
            json!({"page": "<>"}),
            "10.0.0.1",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_visit_with_wrong_page_type_is_rejected() {
    let app = TestApp::new(test_config());
    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/visits",
            json!({"page": ["/", "/about"]}),
            "10.0.0.1",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_disabled_visit_stats_are_omitted() {
    let mut config = test_config();
    config.stats.visit_stats_enabled = false;
    let app = TestApp::new(config);

    let response = app
        .send(json_request(
            Method::POST,
            "/api/v1/visits",
            json!({"page": "/"}),
            "10.0.0.1",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let body = fetch_stats(&app).await;
    assert!(body.get("visitStats").is_none());
    assert_eq!(body["totalRegistrations"], 0);
}

#[tokio::test]
async fn test_health_reports_in_memory_backend() {
    let app = TestApp::new(test_config());
    let response = app
        .send(empty_request(Method::GET, "/api/health", false))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"]["backend"], "in_memory");

    let response = app
        .send(empty_request(Method::GET, "/api/health/ready", false))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}
