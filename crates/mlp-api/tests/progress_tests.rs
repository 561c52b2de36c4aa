use axum::http::StatusCode;
use serde_json::json;

use crate::common::id_of;

#[tokio::test]
async fn test_share_counts_and_first_share_milestone() {
    let app = db_app_or_skip!();
    let user = app.register("sharer").await;

    let share = app
        .post(
            "/v1/progress/shares",
            Some(&user.access_token),
            json!({"shareType": "custom", "content": "  Day one done  "}),
        )
        .await;
    share.assert_status(StatusCode::CREATED);
    assert_eq!(share.data()["content"], "Day one done");
    assert_eq!(share.data()["visibility"], "public");
    assert_eq!(share.data()["reactionsCount"], 0);

    let stats = app.get("/v1/progress/stats", Some(&user.access_token)).await;
    stats.assert_status(StatusCode::OK);
    assert_eq!(stats.data()["sharesCount"], 1);

    let milestones = app
        .get("/v1/progress/milestones", Some(&user.access_token))
        .await;
    milestones.assert_status(StatusCode::OK);
    let types: Vec<&str> = milestones
        .data()
        .as_array()
        .map(|items| items.iter().filter_map(|m| m["milestoneType"].as_str()).collect())
        .unwrap_or_default();
    assert!(types.contains(&"first_share"));

    let activity = app
        .get("/v1/progress/activity", Some(&user.access_token))
        .await;
    activity.assert_status(StatusCode::OK);
    assert!(
        activity
            .data()
            .as_array()
            .is_some_and(|items| items.iter().any(|a| a["activityType"] == "progress_shared"))
    );
}

#[tokio::test]
async fn test_reaction_toggles_and_switches() {
    let app = db_app_or_skip!();
    let author = app.register("poster").await;
    let friend = app.register("friend").await;

    let share = app
        .post(
            "/v1/progress/shares",
            Some(&author.access_token),
            json!({"shareType": "custom", "content": "Finished the borrow checker module"}),
        )
        .await;
    let uri = format!("/v1/progress/shares/{}/reactions", id_of(share.data()));

    let first = app
        .post(&uri, Some(&friend.access_token), json!({"type": "celebrate"}))
        .await;
    first.assert_status(StatusCode::OK);
    assert_eq!(first.data()["userReaction"], "celebrate");
    assert_eq!(first.data()["reactions"][0]["count"], 1);

    let switched = app
        .post(&uri, Some(&friend.access_token), json!({"reactionType": "support"}))
        .await;
    assert_eq!(switched.data()["userReaction"], "support");
    assert_eq!(switched.data()["reactions"].as_array().map(Vec::len), Some(1));

    let removed = app
        .post(&uri, Some(&friend.access_token), json!({"type": "support"}))
        .await;
    removed.assert_status(StatusCode::OK);
    assert!(removed.data()["userReaction"].is_null());
    assert_eq!(removed.data()["reactions"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_private_share_hidden_from_others() {
    let app = db_app_or_skip!();
    let author = app.register("secret").await;
    let other = app.register("nosy").await;

    let share = app
        .post(
            "/v1/progress/shares",
            Some(&author.access_token),
            json!({"shareType": "custom", "content": "Just for me", "visibility": "private"}),
        )
        .await;
    share.assert_status(StatusCode::CREATED);
    let uri = format!("/v1/progress/shares/{}", id_of(share.data()));

    app.get(&uri, Some(&author.access_token))
        .await
        .assert_status(StatusCode::OK);
    app.get(&uri, Some(&other.access_token))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.get(&uri, None).await.assert_status(StatusCode::NOT_FOUND);
    app.post(
        &format!("{uri}/reactions"),
        Some(&other.access_token),
        json!({"type": "like"}),
    )
    .await
    .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_share_comments_and_delete() {
    let app = db_app_or_skip!();
    let author = app.register("author").await;
    let other = app.register("reader").await;

    let share = app
        .post(
            "/v1/progress/shares",
            Some(&author.access_token),
            json!({"shareType": "custom", "content": "Level up!"}),
        )
        .await;
    let uri = format!("/v1/progress/shares/{}", id_of(share.data()));

    let comment = app
        .post(&format!("{uri}/comments"), Some(&other.access_token), json!({"content": "Nice"}))
        .await;
    comment.assert_status(StatusCode::CREATED);

    let detail = app.get(&uri, None).await;
    detail.assert_status(StatusCode::OK);
    assert_eq!(detail.data()["commentsCount"], 1);
    assert_eq!(detail.data()["comments"][0]["content"], "Nice");

    app.delete(&uri, Some(&other.access_token))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.delete(&uri, Some(&author.access_token))
        .await
        .assert_status(StatusCode::OK);
    app.get(&uri, None).await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recalculate_rebuilds_from_history() {
    let app = db_app_or_skip!();
    let author = app.register("author").await;
    let learner = app.register("learner").await;
    let lesson_id = app.create_lesson(&author, json!({"xpReward": 40})).await;

    app.post(
        &format!("/v1/lessons/{lesson_id}/complete"),
        Some(&learner.access_token),
        json!({}),
    )
    .await
    .assert_status(StatusCode::OK);

    sqlx::query("UPDATE progress_stats SET total_xp = 0, lessons_completed = 0 WHERE user_id = $1")
        .bind(learner.id)
        .execute(&app.pool)
        .await
        .expect("reset stats");

    let stats = app
        .post("/v1/progress/stats/recalculate", Some(&learner.access_token), json!({}))
        .await;
    stats.assert_status(StatusCode::OK);
    assert_eq!(stats.data()["totalXp"], 40);
    assert_eq!(stats.data()["lessonsCompleted"], 1);

    let public = app
        .get(&format!("/v1/progress/stats/{}", learner.id), None)
        .await;
    public.assert_status(StatusCode::OK);
    assert_eq!(public.data()["totalXp"], 40);
}

#[tokio::test]
async fn test_leaderboard_includes_new_user() {
    let app = db_app_or_skip!();
    let user = app.register("ranked").await;

    let board = app.get("/v1/leaderboard?limit=5", None).await;
    board.assert_status(StatusCode::OK);
    assert!(board.body["meta"]["total"].as_i64().is_some_and(|total| total >= 1));

    let me = app.get("/v1/leaderboard/me", Some(&user.access_token)).await;
    me.assert_status(StatusCode::OK);
    assert!(me.data()["rank"].as_i64().is_some_and(|rank| rank >= 1));
}

#[tokio::test]
async fn test_recalculate_keeps_xp_from_deleted_content() {
    let app = db_app_or_skip!();
    let admin = app.register_admin("curator").await;
    let learner = app.register("learner").await;
    let lesson_id = app.create_lesson(&admin, json!({"xpReward": 30})).await;

    app.post(
        &format!("/v1/lessons/{lesson_id}/complete"),
        Some(&learner.access_token),
        json!({}),
    )
    .await
    .assert_status(StatusCode::OK);

    let challenge = app
        .post(
            "/v1/challenges",
            Some(&admin.access_token),
            json!({"title": "Say hi", "type": "post_comments", "target": 1, "rewardXp": 20}),
        )
        .await;
    challenge.assert_status(StatusCode::CREATED);
    let challenge_uri = format!("/v1/challenges/{}", id_of(challenge.data()));
    app.post(&format!("{challenge_uri}/join"), Some(&learner.access_token), json!({}))
        .await
        .assert_status(StatusCode::CREATED);
    app.post(
        &format!("{challenge_uri}/progress"),
        Some(&learner.access_token),
        json!({"amount": 1}),
    )
    .await
    .assert_status(StatusCode::OK);
    app.post(&format!("{challenge_uri}/claim"), Some(&learner.access_token), json!({}))
        .await
        .assert_status(StatusCode::OK);

    let before = app.get("/v1/progress/stats", Some(&learner.access_token)).await;
    let earned = before.data()["totalXp"].as_i64().expect("total xp");
    assert!(earned >= 50);

    app.delete(&format!("/v1/lessons/{lesson_id}"), Some(&admin.access_token))
        .await
        .assert_status(StatusCode::OK);
    app.delete(&challenge_uri, Some(&admin.access_token))
        .await
        .assert_status(StatusCode::OK);

    let after = app
        .post("/v1/progress/stats/recalculate", Some(&learner.access_token), json!({}))
        .await;
    after.assert_status(StatusCode::OK);
    assert_eq!(after.data()["totalXp"], earned);
    assert_eq!(after.data()["lessonsCompleted"], 1);
    assert_eq!(after.data()["challengesCompleted"], 1);
}
