use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_lesson_crud_and_ownership() {
    let app = db_app_or_skip!();
    let author = app.register("author").await;
    let other = app.register("other").await;
    let admin = app.register_admin("admin").await;

    let id = app.create_lesson(&author, json!({})).await;

    let fetched = app.get(&format!("/v1/lessons/{id}"), None).await;
    fetched.assert_status(StatusCode::OK);
    assert_eq!(fetched.data()["authorUsername"], author.username.as_str());
    assert_eq!(fetched.data()["tags"], json!(["rust-basics"]));

    app.patch(
        &format!("/v1/lessons/{id}"),
        Some(&other.access_token),
        json!({"title": "Hijacked"}),
    )
    .await
    .assert_status(StatusCode::FORBIDDEN);

    let updated = app
        .patch(
            &format!("/v1/lessons/{id}"),
            Some(&author.access_token),
            json!({"title": "Borrowing in five minutes"}),
        )
        .await;
    updated.assert_status(StatusCode::OK);
    assert_eq!(updated.data()["title"], "Borrowing in five minutes");
    assert_eq!(updated.data()["content"], "Every value has exactly one owner.");

    app.delete(&format!("/v1/lessons/{id}"), Some(&other.access_token))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.delete(&format!("/v1/lessons/{id}"), Some(&admin.access_token))
        .await
        .assert_status(StatusCode::OK);
    app.get(&format!("/v1/lessons/{id}"), None)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_drafts_visible_only_to_author() {
    let app = db_app_or_skip!();
    let author = app.register("drafter").await;
    let reader = app.register("reader").await;

    let id = app
        .create_lesson(&author, json!({"isPublished": false}))
        .await;

    app.get(&format!("/v1/lessons/{id}"), Some(&reader.access_token))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.get(&format!("/v1/lessons/{id}"), Some(&author.access_token))
        .await
        .assert_status(StatusCode::OK);

    // Completing a draft is a client error for the author and invisible to others
    app.post(&format!("/v1/lessons/{id}/complete"), Some(&author.access_token), json!({}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    app.post(&format!("/v1/lessons/{id}/complete"), Some(&reader.access_token), json!({}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_completion_awards_xp_once() {
    let app = db_app_or_skip!();
    let author = app.register("instructor").await;
    let learner = app.register("learner").await;
    let id = app.create_lesson(&author, json!({"xpReward": 25})).await;
    let uri = format!("/v1/lessons/{id}/complete");

    let first = app.post(&uri, Some(&learner.access_token), json!({})).await;
    first.assert_status(StatusCode::OK);
    assert_eq!(first.data()["alreadyCompleted"], false);
    assert_eq!(first.data()["xpAwarded"], 25);
    assert_eq!(first.data()["totalXp"], 25);
    assert!(
        first.data()["newMilestones"]
            .as_array()
            .is_some_and(|m| m.contains(&json!("first_lesson")))
    );

    let second = app.post(&uri, Some(&learner.access_token), json!({})).await;
    second.assert_status(StatusCode::OK);
    assert_eq!(second.data()["alreadyCompleted"], true);
    assert_eq!(second.data()["xpAwarded"], 0);
    assert_eq!(second.data()["totalXp"], 25);

    let stats = app.get("/v1/progress/stats", Some(&learner.access_token)).await;
    stats.assert_status(StatusCode::OK);
    assert_eq!(stats.data()["totalXp"], 25);
    assert_eq!(stats.data()["lessonsCompleted"], 1);
}

#[tokio::test]
async fn test_list_filters_and_paginates() {
    let app = db_app_or_skip!();
    let author = app.register("lister").await;
    let category = crate::common::unique_name("cat");

    for _ in 0..3 {
        app.create_lesson(&author, json!({"category": category})).await;
    }

    let page = app
        .get(&format!("/v1/lessons?category={category}&limit=2&page=1"), None)
        .await;
    page.assert_status(StatusCode::OK);
    assert_eq!(page.data().as_array().map(Vec::len), Some(2));
    assert_eq!(page.body["meta"]["total"], 3);
    assert_eq!(page.body["meta"]["totalPages"], 2);
    assert_eq!(page.body["meta"]["limit"], 2);
}

#[tokio::test]
async fn test_whitespace_title_or_category_is_rejected() {
    let app = db_app_or_skip!();
    let author = app.register("author").await;

    app.post(
        "/v1/lessons",
        Some(&author.access_token),
        json!({"title": "   ", "content": "Body", "category": "rust"}),
    )
    .await
    .assert_status(StatusCode::BAD_REQUEST);
    app.post(
        "/v1/lessons",
        Some(&author.access_token),
        json!({"title": "Lifetimes", "content": "Body", "category": " \t "}),
    )
    .await
    .assert_status(StatusCode::BAD_REQUEST);

    let id = app.create_lesson(&author, json!({})).await;
    app.patch(
        &format!("/v1/lessons/{id}"),
        Some(&author.access_token),
        json!({"category": "  "}),
    )
    .await
    .assert_status(StatusCode::BAD_REQUEST);

    let unchanged = app.get(&format!("/v1/lessons/{id}"), None).await;
    unchanged.assert_status(StatusCode::OK);
    assert!(!unchanged.data()["category"].as_str().unwrap_or("").trim().is_empty());
}
