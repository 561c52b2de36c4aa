use axum::http::StatusCode;
use serde_json::json;

use crate::common::{TEST_PASSWORD, unique_name};

#[tokio::test]
async fn test_register_returns_session_and_stats() {
    let app = db_app_or_skip!();

    let user = app.register("reg").await;

    let me = app.get("/v1/auth/me", Some(&user.access_token)).await;
    me.assert_status(StatusCode::OK);
    assert_eq!(me.data()["user"]["username"], user.username.as_str());
    assert_eq!(me.data()["user"]["role"], "user");
    assert_eq!(me.data()["stats"]["totalXp"], 0);
    assert_eq!(me.data()["stats"]["level"], 1);
}

#[tokio::test]
async fn test_duplicate_username_and_email_conflict() {
    let app = db_app_or_skip!();
    let user = app.register("dup").await;

    let same_email = app
        .post(
            "/v1/auth/register",
            None,
            json!({"username": unique_name("dup"), "email": user.email, "password": TEST_PASSWORD}),
        )
        .await;
    same_email.assert_status(StatusCode::CONFLICT);

    let same_username = app
        .post(
            "/v1/auth/register",
            None,
            json!({
                "username": user.username,
                "email": format!("{}@example.com", unique_name("other")),
                "password": TEST_PASSWORD
            }),
        )
        .await;
    same_username.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_weak_password_rejected() {
    let app = db_app_or_skip!();
    let username = unique_name("weak");

    let response = app
        .post(
            "/v1/auth/register",
            None,
            json!({"username": username, "email": format!("{username}@example.com"), "password": "letters"}),
        )
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_normalises_email_and_hides_failure_reason() {
    let app = db_app_or_skip!();
    let user = app.register("login").await;

    let ok = app
        .post(
            "/v1/auth/login",
            None,
            json!({"email": format!("  {}  ", user.email.to_uppercase()), "password": TEST_PASSWORD}),
        )
        .await;
    ok.assert_status(StatusCode::OK);
    assert!(ok.data()["accessToken"].is_string());

    let wrong_password = app
        .post(
            "/v1/auth/login",
            None,
            json!({"email": user.email, "password": "wrongpass1"}),
        )
        .await;
    let unknown_email = app
        .post(
            "/v1/auth/login",
            None,
            json!({"email": "nobody-here@example.com", "password": "wrongpass1"}),
        )
        .await;

    wrong_password.assert_status(StatusCode::UNAUTHORIZED);
    unknown_email.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body["message"], unknown_email.body["message"]);
}

#[tokio::test]
async fn test_refresh_rotates_token() {
    let app = db_app_or_skip!();
    let user = app.register("rot").await;

    let first = app
        .post(
            "/v1/auth/refresh",
            None,
            json!({"refreshToken": user.refresh_token}),
        )
        .await;
    first.assert_status(StatusCode::OK);
    let rotated = first.data()["refreshToken"].as_str().expect("new token");
    assert_ne!(rotated, user.refresh_token);

    // The old token was consumed by the rotation
    let replay = app
        .post(
            "/v1/auth/refresh",
            None,
            json!({"refreshToken": user.refresh_token}),
        )
        .await;
    replay.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let app = db_app_or_skip!();
    let user = app.register("out").await;

    for _ in 0..2 {
        app.post(
            "/v1/auth/logout",
            None,
            json!({"refreshToken": user.refresh_token}),
        )
        .await
        .assert_status(StatusCode::OK);
    }

    app.post(
        "/v1/auth/refresh",
        None,
        json!({"refreshToken": user.refresh_token}),
    )
    .await
    .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_banned_user_is_forbidden_with_existing_token() {
    let app = db_app_or_skip!();
    let user = app.register("ban").await;

    sqlx::query("UPDATE users SET is_banned = true WHERE id = $1")
        .bind(user.id)
        .execute(&app.pool)
        .await
        .expect("ban user");

    app.get("/v1/auth/me", Some(&user.access_token))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.post(
        "/v1/auth/login",
        None,
        json!({"email": user.email, "password": TEST_PASSWORD}),
    )
    .await
    .assert_status(StatusCode::FORBIDDEN);
}
