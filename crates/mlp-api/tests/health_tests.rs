use axum::http::StatusCode;
use serde_json::json;

use crate::common::TestApp;

#[tokio::test]
async fn test_health_is_alive_without_database() {
    let app = TestApp::offline();

    let response = app.get("/health", None).await;

    response.assert_status(StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["statusCode"], 200);
    assert_eq!(response.data()["status"], "ok");
}

#[tokio::test]
async fn test_ready_reports_unavailable_database() {
    let app = TestApp::offline();

    let response = app.get("/health/ready", None).await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["statusCode"], 503);
}

#[tokio::test]
async fn test_unknown_route_uses_error_envelope() {
    let app = TestApp::offline();

    let response = app.get("/v1/does-not-exist", None).await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["statusCode"], 404);
    assert!(response.body["message"].is_string());
}

#[tokio::test]
async fn test_protected_route_requires_bearer_token() {
    let app = TestApp::offline();

    for uri in ["/v1/auth/me", "/v1/progress/stats", "/v1/uploads"] {
        let response = app.get(uri, None).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.body["success"], false);
    }
}

#[tokio::test]
async fn test_malformed_token_rejected() {
    let app = TestApp::offline();

    let response = app.get("/v1/auth/me", Some("not-a-jwt")).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bad_query_string_is_400_envelope() {
    let app = TestApp::offline();

    let response = app.get("/v1/lessons?page=first", None).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.body["statusCode"], 400);
}

#[tokio::test]
async fn test_invalid_body_rejected_before_database() {
    let app = TestApp::offline();

    let response = app
        .post("/v1/auth/register", None, json!({"username": "only"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], false);
}

#[tokio::test]
async fn test_auth_rate_limit_kicks_in() {
    let app = TestApp::offline();

    let mut statuses = Vec::new();
    for _ in 0..15 {
        // Blank credentials fail validation, so the database is never touched
        let response = app
            .post("/v1/auth/login", None, json!({"email": "", "password": ""}))
            .await;
        statuses.push(response.status);
    }

    assert_eq!(statuses[0], StatusCode::BAD_REQUEST);
    assert!(
        statuses.contains(&StatusCode::TOO_MANY_REQUESTS),
        "expected a 429 within 15 requests, got {statuses:?}"
    );
}

#[tokio::test]
async fn test_voice_catalog_is_public() {
    let app = TestApp::offline();

    let response = app.get("/v1/tts/voices", None).await;

    response.assert_status(StatusCode::OK);
    assert_eq!(response.data()["voices"].as_array().map(Vec::len), Some(6));
    assert_eq!(response.data()["models"][1], "tts-1-hd");
}
