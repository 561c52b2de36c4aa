use axum::{
    Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use mlp_db::{
    models::{ActivityEntry, ActivityType, ChallengeType, ShareComment, StatCounter},
    pagination::{PageParams, Pagination},
    repositories::{progress as progress_repo, social as social_repo, user as user_repo},
};
use mlp_game::level_for_xp;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    model::{
        CreateShareRequest, FeedItem, MilestoneView, ReactionRequest, ReactionResponse,
        ShareCommentRequest, ShareDetail, StatsResponse, attach_reactions, can_view,
        next_reaction,
    },
    service,
};
use crate::{
    ApiState,
    auth::AuthUser,
    error::ApiError,
    response::ApiResponse,
    validation::{ValidatedJson, ValidatedQuery},
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/progress/stats", get(my_stats))
        .route("/progress/stats/recalculate", post(recalculate_stats))
        .route("/progress/stats/{id}", get(user_stats))
        .route("/progress/shares", post(create_share))
        .route("/progress/shares/{id}", get(get_share).delete(delete_share))
        .route("/progress/shares/{id}/reactions", post(react_to_share))
        .route("/progress/shares/{id}/comments", post(comment_on_share))
        .route(
            "/progress/shares/{id}/comments/{comment_id}",
            delete(delete_share_comment),
        )
        .route("/progress/feed", get(feed))
        .route("/progress/activity", get(activity))
        .route("/progress/milestones", get(milestones))
}

async fn load_stats(pool: &PgPool, user_id: Uuid) -> Result<StatsResponse, ApiError> {
    if let Some(stats) = progress_repo::find_stats(pool, user_id).await? {
        return Ok(stats.into());
    }

    // Accounts predating the stats table get a zeroed snapshot on first read
    user_repo::create_user_stats(pool, user_id).await?;
    progress_repo::find_stats(pool, user_id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ApiError::not_found("Progress stats"))
}

async fn my_stats(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<ApiResponse<StatsResponse>, ApiError> {
    let stats = load_stats(&state.pool, auth_user.user_id).await?;
    Ok(ApiResponse::ok("Progress stats retrieved", stats))
}

async fn user_stats(
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
) -> Result<ApiResponse<StatsResponse>, ApiError> {
    if !user_repo::exists(&state.pool, user_id).await? {
        return Err(ApiError::not_found("User"));
    }
    let stats = load_stats(&state.pool, user_id).await?;
    Ok(ApiResponse::ok("Progress stats retrieved", stats))
}

async fn recalculate_stats(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<ApiResponse<StatsResponse>, ApiError> {
    let user_id = auth_user.user_id;
    let mut tx = state.pool.begin().await?;

    let recount = progress_repo::recount(&mut *tx, user_id).await?;
    let stats =
        progress_repo::store_recount(&mut *tx, user_id, &recount, level_for_xp(recount.total_xp))
            .await?;
    service::check_milestones(&mut tx, user_id).await?;

    tx.commit().await?;

    tracing::info!(%user_id, total_xp = stats.total_xp, "progress stats recalculated");

    Ok(ApiResponse::ok("Progress stats recalculated", stats.into()))
}

async fn share_detail(
    pool: &PgPool,
    share_id: Uuid,
    viewer_id: Option<Uuid>,
) -> Result<ShareDetail, ApiError> {
    let share = social_repo::find_share(pool, share_id, viewer_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Share"))?;
    let share_ids = [share_id];
    let (reactions, comments) = tokio::try_join!(
        social_repo::reaction_counts(pool, &share_ids),
        social_repo::list_comments(pool, share_id),
    )?;

    Ok(ShareDetail {
        share,
        reactions,
        comments,
    })
}

async fn create_share(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedJson(payload): ValidatedJson<CreateShareRequest>,
) -> Result<ApiResponse<ShareDetail>, ApiError> {
    let user_id = auth_user.user_id;
    let content = payload.content.trim();
    if content.is_empty() {
        return Err(ApiError::Validation("content: must not be blank".to_string()));
    }
    let metadata = payload.metadata.unwrap_or_else(|| serde_json::json!({}));

    let mut tx = state.pool.begin().await?;

    let share_id = social_repo::create_share(
        &mut *tx,
        user_id,
        payload.share_type,
        content,
        &metadata,
        payload.visibility,
    )
    .await?;
    progress_repo::increment_counter(&mut *tx, user_id, StatCounter::SharesCount, 1).await?;
    service::record_activity(
        &mut tx,
        user_id,
        ActivityType::ProgressShared,
        "Shared progress",
        0,
        Some(share_id),
        serde_json::json!({ "shareType": payload.share_type }),
    )
    .await?;
    service::advance_challenges(&mut tx, user_id, ChallengeType::ShareProgress, 1).await?;
    service::check_milestones(&mut tx, user_id).await?;

    tx.commit().await?;

    let detail = share_detail(&state.pool, share_id, Some(user_id)).await?;
    Ok(ApiResponse::created("Progress shared", detail))
}

async fn get_share(
    viewer: Option<AuthUser>,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<ShareDetail>, ApiError> {
    let viewer_id = viewer.map(|v| v.user_id);
    let access = social_repo::find_share_access(&state.pool, id)
        .await?
        .filter(|share| can_view(share, viewer_id))
        .ok_or_else(|| ApiError::not_found("Share"))?;

    let detail = share_detail(&state.pool, access.id, viewer_id).await?;
    Ok(ApiResponse::ok("Share retrieved", detail))
}

async fn delete_share(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    let access = social_repo::find_share_access(&state.pool, id)
        .await?
        .filter(|share| can_view(share, Some(auth_user.user_id)) || auth_user.is_admin())
        .ok_or_else(|| ApiError::not_found("Share"))?;
    if !auth_user.can_manage(access.user_id) {
        return Err(ApiError::Forbidden(
            "Only the owner or an admin can delete this share".to_string(),
        ));
    }

    if !social_repo::delete_share(&state.pool, id, auth_user.user_id, auth_user.is_admin()).await? {
        return Err(ApiError::not_found("Share"));
    }

    Ok(ApiResponse::ok("Share deleted", ()))
}

async fn feed(
    viewer: Option<AuthUser>,
    State(state): State<ApiState>,
    ValidatedQuery(page): ValidatedQuery<PageParams>,
) -> Result<ApiResponse<Vec<FeedItem>>, ApiError> {
    let page = Pagination::from(page);
    let viewer_id = viewer.map(|v| v.user_id);

    let (shares, total) = tokio::try_join!(
        social_repo::list_public_feed(&state.pool, viewer_id, page.limit, page.offset()),
        social_repo::count_public_feed(&state.pool),
    )?;

    let share_ids: Vec<Uuid> = shares.iter().map(|s| s.id).collect();
    let counts = if share_ids.is_empty() {
        Vec::new()
    } else {
        social_repo::reaction_counts(&state.pool, &share_ids).await?
    };

    Ok(ApiResponse::paginated(
        "Feed retrieved",
        attach_reactions(shares, counts),
        page.meta(total),
    ))
}

async fn react_to_share(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ReactionRequest>,
) -> Result<ApiResponse<ReactionResponse>, ApiError> {
    let user_id = auth_user.user_id;
    let mut tx = state.pool.begin().await?;

    social_repo::find_share_access(&mut *tx, id)
        .await?
        .filter(|share| can_view(share, Some(user_id)))
        .ok_or_else(|| ApiError::not_found("Share"))?;

    let current = social_repo::find_reaction(&mut *tx, id, user_id).await?;
    let user_reaction = next_reaction(current, payload.reaction_type);
    match user_reaction {
        Some(reaction) => social_repo::upsert_reaction(&mut *tx, id, user_id, reaction).await?,
        None => social_repo::delete_reaction(&mut *tx, id, user_id).await?,
    }
    let reactions = social_repo::reaction_counts(&mut *tx, &[id]).await?;

    tx.commit().await?;

    let message = if user_reaction.is_some() {
        "Reaction saved"
    } else {
        "Reaction removed"
    };
    Ok(ApiResponse::ok(
        message,
        ReactionResponse {
            user_reaction,
            reactions,
        },
    ))
}

async fn comment_on_share(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ShareCommentRequest>,
) -> Result<ApiResponse<ShareComment>, ApiError> {
    let content = payload.content.trim();
    if content.is_empty() {
        return Err(ApiError::Validation("content: must not be blank".to_string()));
    }

    social_repo::find_share_access(&state.pool, id)
        .await?
        .filter(|share| can_view(share, Some(auth_user.user_id)))
        .ok_or_else(|| ApiError::not_found("Share"))?;

    let comment = social_repo::create_comment(&state.pool, id, auth_user.user_id, content).await?;

    Ok(ApiResponse::created("Comment added", comment))
}

async fn delete_share_comment(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path((share_id, comment_id)): Path<(Uuid, Uuid)>,
) -> Result<ApiResponse<()>, ApiError> {
    let share = social_repo::find_share_access(&state.pool, share_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Share"))?;
    let author_id = social_repo::find_comment_author(&state.pool, share_id, comment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment"))?;

    // Comment author, share owner or admin
    let allowed = auth_user.can_manage(author_id) || auth_user.user_id == share.user_id;
    if !allowed {
        return Err(ApiError::Forbidden(
            "You cannot delete this comment".to_string(),
        ));
    }

    if !social_repo::delete_comment(&state.pool, comment_id).await? {
        return Err(ApiError::not_found("Comment"));
    }

    Ok(ApiResponse::ok("Comment deleted", ()))
}

async fn activity(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    ValidatedQuery(page): ValidatedQuery<PageParams>,
) -> Result<ApiResponse<Vec<ActivityEntry>>, ApiError> {
    let page = Pagination::from(page);
    let (entries, total) = tokio::try_join!(
        progress_repo::list_activity(&state.pool, auth_user.user_id, page.limit, page.offset()),
        progress_repo::count_activity(&state.pool, auth_user.user_id),
    )?;

    Ok(ApiResponse::paginated(
        "Activity retrieved",
        entries,
        page.meta(total),
    ))
}

async fn milestones(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<ApiResponse<Vec<MilestoneView>>, ApiError> {
    let milestones = progress_repo::list_milestones(&state.pool, auth_user.user_id)
        .await?
        .into_iter()
        .map(MilestoneView::from)
        .collect();

    Ok(ApiResponse::ok("Milestones retrieved", milestones))
}
