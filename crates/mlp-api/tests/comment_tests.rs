use axum::http::StatusCode;
use serde_json::json;

use crate::common::id_of;

#[tokio::test]
async fn test_thread_with_flattened_replies() {
    let app = db_app_or_skip!();
    let author = app.register("cauthor").await;
    let replier = app.register("replier").await;
    let lesson_id = app.create_lesson(&author, json!({})).await;
    let uri = format!("/v1/lessons/{lesson_id}/comments");

    let root = app
        .post(&uri, Some(&author.access_token), json!({"content": "  Great lesson  "}))
        .await;
    root.assert_status(StatusCode::CREATED);
    assert_eq!(root.data()["content"], "Great lesson");
    let root_id = id_of(root.data());

    let reply = app
        .post(
            &uri,
            Some(&replier.access_token),
            json!({"content": "Agreed", "parentCommentId": root_id}),
        )
        .await;
    reply.assert_status(StatusCode::CREATED);
    let reply_id = id_of(reply.data());

    // A reply to a reply hangs off the thread root
    let nested = app
        .post(
            &uri,
            Some(&author.access_token),
            json!({"content": "Thanks!", "parentCommentId": reply_id}),
        )
        .await;
    nested.assert_status(StatusCode::CREATED);
    assert_eq!(nested.data()["parentCommentId"], root_id.to_string());

    let listing = app.get(&uri, None).await;
    listing.assert_status(StatusCode::OK);
    assert_eq!(listing.body["meta"]["total"], 1);
    assert_eq!(listing.data()[0]["id"], root_id.to_string());
    assert_eq!(listing.data()[0]["replies"].as_array().map(Vec::len), Some(2));

    let replies = app.get(&format!("/v1/comments/{root_id}/replies"), None).await;
    replies.assert_status(StatusCode::OK);
    assert_eq!(replies.body["meta"]["total"], 2);
}

#[tokio::test]
async fn test_like_toggle_restores_count() {
    let app = db_app_or_skip!();
    let author = app.register("likeauth").await;
    let fan = app.register("fan").await;
    let lesson_id = app.create_lesson(&author, json!({})).await;

    let comment = app
        .post(
            &format!("/v1/lessons/{lesson_id}/comments"),
            Some(&author.access_token),
            json!({"content": "Like me"}),
        )
        .await;
    let like_uri = format!("/v1/comments/{}/like", id_of(comment.data()));

    let liked = app.post(&like_uri, Some(&fan.access_token), json!({})).await;
    liked.assert_status(StatusCode::OK);
    assert_eq!(liked.data()["likes"], 1);
    assert_eq!(liked.data()["isLiked"], true);

    let unliked = app.post(&like_uri, Some(&fan.access_token), json!({})).await;
    unliked.assert_status(StatusCode::OK);
    assert_eq!(unliked.data()["likes"], 0);
    assert_eq!(unliked.data()["isLiked"], false);
}

#[tokio::test]
async fn test_edit_delete_and_report_rules() {
    let app = db_app_or_skip!();
    let author = app.register("editor").await;
    let other = app.register("bystander").await;
    let lesson_id = app.create_lesson(&author, json!({})).await;

    let comment = app
        .post(
            &format!("/v1/lessons/{lesson_id}/comments"),
            Some(&author.access_token),
            json!({"content": "First draft"}),
        )
        .await;
    let comment_uri = format!("/v1/comments/{}", id_of(comment.data()));

    app.patch(&comment_uri, Some(&other.access_token), json!({"content": "Mine now"}))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let edited = app
        .patch(&comment_uri, Some(&author.access_token), json!({"content": "Second draft"}))
        .await;
    edited.assert_status(StatusCode::OK);
    assert_eq!(edited.data()["isEdited"], true);

    let report_uri = format!("{comment_uri}/report");
    let report = app
        .post(&report_uri, Some(&other.access_token), json!({"reason": "spam"}))
        .await;
    report.assert_status(StatusCode::OK);
    assert_eq!(report.data()["flagCount"], 1);
    app.post(&report_uri, Some(&other.access_token), json!({"reason": "spam"}))
        .await
        .assert_status(StatusCode::CONFLICT);

    app.delete(&comment_uri, Some(&other.access_token))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let deleted = app.delete(&comment_uri, Some(&author.access_token)).await;
    deleted.assert_status(StatusCode::OK);
    assert_eq!(deleted.data()["isDeleted"], true);
    assert_eq!(deleted.data()["content"], "[Deleted]");

    app.delete(&comment_uri, Some(&author.access_token))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_comment_on_missing_lesson_is_404() {
    let app = db_app_or_skip!();
    let user = app.register("lost").await;

    app.post(
        &format!("/v1/lessons/{}/comments", uuid::Uuid::new_v4()),
        Some(&user.access_token),
        json!({"content": "Hello?"}),
    )
    .await
    .assert_status(StatusCode::NOT_FOUND);
}
