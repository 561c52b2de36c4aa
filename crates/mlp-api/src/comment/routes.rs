use axum::{
    Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use mlp_db::{
    models::{ActivityType, ChallengeType, Comment, StatCounter},
    pagination::{PageParams, Pagination},
    repositories::{comment as comment_repo, lesson as lesson_repo, progress as progress_repo},
};
use uuid::Uuid;

use super::model::{
    CommentListQuery, CommentThread, CreateCommentRequest, LikeResponse, REPLY_PREVIEW_LIMIT,
    ReportCommentRequest, ReportResponse, UpdateCommentRequest, attach_replies, clean_content,
    thread_root,
};
use crate::{
    ApiState,
    auth::AuthUser,
    error::ApiError,
    progress::service as progress_service,
    response::ApiResponse,
    validation::{ValidatedJson, ValidatedQuery},
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route(
            "/lessons/{id}/comments",
            get(list_lesson_comments).post(create_comment),
        )
        .route("/comments/{id}", patch(update_comment).delete(delete_comment))
        .route("/comments/{id}/replies", get(list_replies))
        .route("/comments/{id}/like", post(toggle_like))
        .route("/comments/{id}/report", post(report_comment))
}

fn empty_content() -> ApiError {
    ApiError::Validation("content: must not be blank".to_string())
}

async fn list_lesson_comments(
    viewer: Option<AuthUser>,
    State(state): State<ApiState>,
    Path(lesson_id): Path<Uuid>,
    ValidatedQuery(page): ValidatedQuery<PageParams>,
    ValidatedQuery(query): ValidatedQuery<CommentListQuery>,
) -> Result<ApiResponse<Vec<CommentThread>>, ApiError> {
    if !lesson_repo::exists(&state.pool, lesson_id).await? {
        return Err(ApiError::not_found("Lesson"));
    }

    let page = Pagination::from(page);
    let viewer_id = viewer.map(|v| v.user_id);

    let (top_level, total) = tokio::try_join!(
        comment_repo::list_top_level(
            &state.pool,
            lesson_id,
            viewer_id,
            query.sort,
            page.limit,
            page.offset()
        ),
        comment_repo::count_top_level(&state.pool, lesson_id),
    )?;

    let parent_ids: Vec<Uuid> = top_level.iter().map(|c| c.id).collect();
    let replies = if parent_ids.is_empty() {
        Vec::new()
    } else {
        comment_repo::list_reply_previews(&state.pool, &parent_ids, viewer_id, REPLY_PREVIEW_LIMIT)
            .await?
    };

    Ok(ApiResponse::paginated(
        "Comments retrieved",
        attach_replies(top_level, replies),
        page.meta(total),
    ))
}

async fn create_comment(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(lesson_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CreateCommentRequest>,
) -> Result<ApiResponse<Comment>, ApiError> {
    let content = clean_content(&payload.content).ok_or_else(empty_content)?;
    let user_id = auth_user.user_id;

    let mut tx = state.pool.begin().await?;

    if !lesson_repo::exists(&mut *tx, lesson_id).await? {
        return Err(ApiError::not_found("Lesson"));
    }

    let parent_id = match payload.parent_comment_id {
        None => None,
        Some(parent_id) => {
            let parent = comment_repo::find_access(&mut *tx, parent_id)
                .await?
                .ok_or_else(|| ApiError::not_found("Parent comment"))?;
            if parent.lesson_id != lesson_id {
                return Err(ApiError::BadRequest(
                    "Parent comment belongs to a different lesson".to_string(),
                ));
            }
            if parent.is_deleted {
                return Err(ApiError::BadRequest(
                    "Cannot reply to a deleted comment".to_string(),
                ));
            }

            let root_id = thread_root(&parent);
            if root_id != parent.id {
                let root = comment_repo::find_access(&mut *tx, root_id)
                    .await?
                    .ok_or_else(|| ApiError::not_found("Parent comment"))?;
                if root.is_deleted {
                    return Err(ApiError::BadRequest(
                        "Cannot reply to a deleted comment".to_string(),
                    ));
                }
            }
            Some(root_id)
        }
    };

    let comment_id = comment_repo::create(&mut *tx, lesson_id, user_id, parent_id, &content).await?;

    progress_repo::increment_counter(&mut *tx, user_id, StatCounter::CommentsCount, 1).await?;
    progress_service::record_activity(
        &mut tx,
        user_id,
        ActivityType::CommentPosted,
        "Posted a comment",
        0,
        Some(comment_id),
        serde_json::json!({ "lessonId": lesson_id }),
    )
    .await?;
    progress_service::advance_challenges(&mut tx, user_id, ChallengeType::PostComments, 1).await?;

    let comment = comment_repo::find_by_id(&mut *tx, comment_id, Some(user_id))
        .await?
        .ok_or_else(|| ApiError::Internal("Created comment not found".to_string()))?;

    tx.commit().await?;

    tracing::debug!(%comment_id, %lesson_id, %user_id, "comment created");

    Ok(ApiResponse::created("Comment created", comment))
}

async fn list_replies(
    viewer: Option<AuthUser>,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    ValidatedQuery(page): ValidatedQuery<PageParams>,
) -> Result<ApiResponse<Vec<Comment>>, ApiError> {
    let parent = comment_repo::find_access(&state.pool, id)
        .await?
        .filter(|c| !c.is_deleted)
        .ok_or_else(|| ApiError::not_found("Comment"))?;

    let page = Pagination::from(page);
    let viewer_id = viewer.map(|v| v.user_id);

    let (replies, total) = tokio::try_join!(
        comment_repo::list_replies(&state.pool, parent.id, viewer_id, page.limit, page.offset()),
        comment_repo::count_replies(&state.pool, parent.id),
    )?;

    Ok(ApiResponse::paginated(
        "Replies retrieved",
        replies,
        page.meta(total),
    ))
}

async fn update_comment(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateCommentRequest>,
) -> Result<ApiResponse<Comment>, ApiError> {
    let content = clean_content(&payload.content).ok_or_else(empty_content)?;

    let access = comment_repo::find_access(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment"))?;
    if access.user_id != auth_user.user_id {
        return Err(ApiError::Forbidden(
            "You can only edit your own comments".to_string(),
        ));
    }
    if access.is_deleted {
        return Err(ApiError::BadRequest(
            "Cannot edit a deleted comment".to_string(),
        ));
    }

    if !comment_repo::update_content(&state.pool, id, auth_user.user_id, &content).await? {
        // Deleted between the check and the update
        return Err(ApiError::BadRequest(
            "Cannot edit a deleted comment".to_string(),
        ));
    }

    let comment = comment_repo::find_by_id(&state.pool, id, Some(auth_user.user_id))
        .await?
        .ok_or_else(|| ApiError::not_found("Comment"))?;

    Ok(ApiResponse::ok("Comment updated", comment))
}

async fn delete_comment(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Comment>, ApiError> {
    let access = comment_repo::find_access(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment"))?;
    if !auth_user.can_manage(access.user_id) {
        return Err(ApiError::Forbidden(
            "Only the author or an admin can delete this comment".to_string(),
        ));
    }
    if access.is_deleted {
        return Err(ApiError::BadRequest("Comment already deleted".to_string()));
    }

    if !comment_repo::soft_delete(&state.pool, id, auth_user.user_id, auth_user.is_admin()).await? {
        return Err(ApiError::BadRequest("Comment already deleted".to_string()));
    }

    let comment = comment_repo::find_by_id(&state.pool, id, Some(auth_user.user_id))
        .await?
        .ok_or_else(|| ApiError::not_found("Comment"))?;

    tracing::info!(comment_id = %id, actor_id = %auth_user.user_id, "comment deleted");

    Ok(ApiResponse::ok("Comment deleted", comment))
}

async fn toggle_like(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<LikeResponse>, ApiError> {
    let mut tx = state.pool.begin().await?;

    let access = comment_repo::find_access(&mut *tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment"))?;
    if access.is_deleted {
        return Err(ApiError::BadRequest(
            "Cannot like a deleted comment".to_string(),
        ));
    }

    // The membership row decides the direction; the counter follows in the same transaction
    let (likes, is_liked) = if comment_repo::insert_like(&mut *tx, id, auth_user.user_id).await? {
        (comment_repo::adjust_likes(&mut *tx, id, 1).await?, true)
    } else {
        let removed = comment_repo::delete_like(&mut *tx, id, auth_user.user_id).await?;
        let delta = if removed { -1 } else { 0 };
        (comment_repo::adjust_likes(&mut *tx, id, delta).await?, false)
    };

    tx.commit().await?;

    let message = if is_liked { "Comment liked" } else { "Comment unliked" };
    Ok(ApiResponse::ok(message, LikeResponse { likes, is_liked }))
}

async fn report_comment(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ReportCommentRequest>,
) -> Result<ApiResponse<ReportResponse>, ApiError> {
    let reason = clean_content(&payload.reason)
        .ok_or_else(|| ApiError::Validation("reason: must not be blank".to_string()))?;

    let mut tx = state.pool.begin().await?;

    let access = comment_repo::find_access(&mut *tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment"))?;
    if access.is_deleted {
        return Err(ApiError::BadRequest(
            "Cannot report a deleted comment".to_string(),
        ));
    }

    comment_repo::insert_report(&mut *tx, id, auth_user.user_id, &reason)
        .await
        .map_err(ApiError::on_duplicate("You have already reported this comment"))?;
    let flag_count = comment_repo::flag(&mut *tx, id).await?;

    tx.commit().await?;

    tracing::info!(comment_id = %id, flag_count, "comment reported");

    Ok(ApiResponse::ok(
        "Comment reported",
        ReportResponse { flag_count },
    ))
}
